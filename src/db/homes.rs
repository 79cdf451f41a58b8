// Database service for listings, images and inquiries

use crate::db::queries::{
    home_filter, home_update, list_homes_sql, update_home_sql, DELETE_HOME, DELETE_IMAGES,
    DELETE_MESSAGES, FIND_CONTACT, FIND_HOME_BY_ID, INSERT_HOME, INSERT_IMAGE, INSERT_MESSAGE,
    LIST_IMAGES, LIST_MESSAGES_BY_HOME,
};
use crate::error::AppError;
use crate::models::{
    Contact, CreateHomeRequest, Home, HomeDetail, HomeQuery, HomeSummary, Inquiry, Message,
    PropertyType, UpdateHomeRequest,
};
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::debug;

pub struct HomeService {
    pool: Pool,
}

impl HomeService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    // Search listings, each with its first image
    pub async fn list_homes(&self, query: &HomeQuery) -> Result<Vec<HomeSummary>, AppError> {
        let client = self.pool.get().await?;

        let filter = home_filter(query);
        let sql = list_homes_sql(&filter.sql);
        let rows = client.query(sql.as_str(), &filter.param_refs()).await?;

        rows.iter()
            .map(|row| -> Result<HomeSummary, AppError> {
                Ok(HomeSummary::from_home(home_from_row(row)?, row.get("image")))
            })
            .collect()
    }

    // Find a home record
    pub async fn find_home(&self, id: i32) -> Result<Option<Home>, AppError> {
        let client = self.pool.get().await?;

        let row = client.query_opt(FIND_HOME_BY_ID, &[&id]).await?;
        row.as_ref().map(home_from_row).transpose()
    }

    // Home with all images and the realtor's contact details
    pub async fn home_detail(&self, id: i32) -> Result<Option<HomeDetail>, AppError> {
        let Some(home) = self.find_home(id).await? else {
            return Ok(None);
        };

        let client = self.pool.get().await?;
        let images: Vec<String> = client
            .query(LIST_IMAGES, &[&id])
            .await?
            .iter()
            .map(|row| row.get("url"))
            .collect();

        let realtor = client
            .query_opt(FIND_CONTACT, &[&home.realtor_id])
            .await?
            .as_ref()
            .map(contact_from_row)
            .ok_or_else(|| {
                AppError::Internal(format!("Home {} references a missing realtor", id))
            })?;

        let first = images.first().cloned();
        Ok(Some(HomeDetail {
            home: HomeSummary::from_home(home, first),
            images,
            realtor,
        }))
    }

    // Create a home and its images in one transaction
    pub async fn create_home(
        &self,
        req: &CreateHomeRequest,
        realtor_id: i32,
    ) -> Result<HomeSummary, AppError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let row = tx
            .query_one(
                INSERT_HOME,
                &[
                    &req.address,
                    &req.city,
                    &req.number_of_bedrooms,
                    &req.number_of_bathrooms,
                    &req.price,
                    &req.land_size,
                    &req.property_type.as_str(),
                    &realtor_id,
                ],
            )
            .await?;
        let home = home_from_row(&row)?;

        for image in &req.images {
            tx.execute(INSERT_IMAGE, &[&image.url, &home.id]).await?;
        }
        tx.commit().await?;

        debug!("Created home {} with {} images", home.id, req.images.len());

        let first = req.images.first().map(|i| i.url.clone());
        Ok(HomeSummary::from_home(home, first))
    }

    // Apply a partial update; None if the home does not exist
    pub async fn update_home(
        &self,
        id: i32,
        update: &UpdateHomeRequest,
    ) -> Result<Option<Home>, AppError> {
        let client = self.pool.get().await?;

        let set = home_update(update);
        let sql = update_home_sql(&set.sql, set.params.len() + 1);
        let mut params = set.param_refs();
        params.push(&id);

        let row = client.query_opt(sql.as_str(), &params).await?;
        row.as_ref().map(home_from_row).transpose()
    }

    // Delete a home with its images and inquiries; false if it did not exist
    pub async fn delete_home(&self, id: i32) -> Result<bool, AppError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        tx.execute(DELETE_MESSAGES, &[&id]).await?;
        tx.execute(DELETE_IMAGES, &[&id]).await?;
        let deleted = tx.execute(DELETE_HOME, &[&id]).await?;
        tx.commit().await?;

        Ok(deleted > 0)
    }

    // Store a buyer inquiry addressed to the home's realtor
    pub async fn create_message(
        &self,
        home: &Home,
        buyer_id: i32,
        message: &str,
    ) -> Result<Message, AppError> {
        let client = self.pool.get().await?;

        let row = client
            .query_one(
                INSERT_MESSAGE,
                &[&message, &home.id, &home.realtor_id, &buyer_id],
            )
            .await?;

        Ok(Message {
            id: row.get("id"),
            message: row.get("message"),
            home_id: row.get("home_id"),
            realtor_id: row.get("realtor_id"),
            buyer_id: row.get("buyer_id"),
        })
    }

    // Inquiries about a home with buyer contact details
    pub async fn messages_by_home(&self, home_id: i32) -> Result<Vec<Inquiry>, AppError> {
        let client = self.pool.get().await?;

        let rows = client.query(LIST_MESSAGES_BY_HOME, &[&home_id]).await?;

        Ok(rows
            .iter()
            .map(|row| Inquiry {
                message: row.get("message"),
                buyer: contact_from_row(row),
            })
            .collect())
    }
}

fn home_from_row(row: &Row) -> Result<Home, AppError> {
    let property_type: String = row.get("property_type");
    let property_type: PropertyType = property_type
        .parse()
        .map_err(|e: String| AppError::Internal(format!("Corrupt home record: {}", e)))?;

    Ok(Home {
        id: row.get("id"),
        address: row.get("address"),
        city: row.get("city"),
        number_of_bedrooms: row.get("number_of_bedrooms"),
        number_of_bathrooms: row.get("number_of_bathrooms"),
        listed_date: row.get("listed_date"),
        price: row.get("price"),
        land_size: row.get("land_size"),
        property_type,
        realtor_id: row.get("realtor_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn contact_from_row(row: &Row) -> Contact {
    Contact {
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
    }
}
