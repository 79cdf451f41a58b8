//! SQL query constants and builders
//!
//! Contains all SQL queries used by the application.

use crate::models::{HomeQuery, UpdateHomeRequest};
use tokio_postgres::types::ToSql;

/// Schema statements, run in order at startup
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        phone VARCHAR(32) NOT NULL,
        email VARCHAR(255) UNIQUE NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        user_type VARCHAR(16) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS homes (
        id SERIAL PRIMARY KEY,
        address VARCHAR(255) NOT NULL,
        number_of_bedrooms INTEGER NOT NULL,
        number_of_bathrooms DOUBLE PRECISION NOT NULL,
        city VARCHAR(255) NOT NULL,
        listed_date TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        price DOUBLE PRECISION NOT NULL,
        land_size DOUBLE PRECISION NOT NULL,
        property_type VARCHAR(16) NOT NULL,
        realtor_id INTEGER NOT NULL REFERENCES users(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS images (
        id SERIAL PRIMARY KEY,
        url TEXT NOT NULL,
        home_id INTEGER NOT NULL REFERENCES homes(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id SERIAL PRIMARY KEY,
        message TEXT NOT NULL,
        home_id INTEGER NOT NULL REFERENCES homes(id),
        realtor_id INTEGER NOT NULL REFERENCES users(id),
        buyer_id INTEGER NOT NULL REFERENCES users(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_homes_city ON homes(city)",
    "CREATE INDEX IF NOT EXISTS idx_images_home_id ON images(home_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_home_id ON messages(home_id)",
];

/// Insert a user
pub const INSERT_USER: &str = r#"
    INSERT INTO users (name, email, phone, password_hash, user_type)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, name, email, phone, password_hash, user_type, created_at, updated_at
"#;

/// Find a user by email
pub const FIND_USER_BY_EMAIL: &str = r#"
    SELECT id, name, email, phone, password_hash, user_type, created_at, updated_at
    FROM users WHERE email = $1
"#;

/// Find a user by id
pub const FIND_USER_BY_ID: &str = r#"
    SELECT id, name, email, phone, password_hash, user_type, created_at, updated_at
    FROM users WHERE id = $1
"#;

/// List all users, newest first
pub const LIST_USERS: &str = r#"
    SELECT id, name, email, phone, password_hash, user_type, created_at, updated_at
    FROM users ORDER BY created_at DESC
"#;

/// Columns selected for a home, aliased `h`
pub const HOME_COLUMNS: &str = "h.id, h.address, h.city, h.number_of_bedrooms, \
    h.number_of_bathrooms, h.listed_date, h.price, h.land_size, h.property_type, \
    h.realtor_id, h.created_at, h.updated_at";

/// Find a home by id
pub const FIND_HOME_BY_ID: &str = r#"
    SELECT h.id, h.address, h.city, h.number_of_bedrooms, h.number_of_bathrooms,
           h.listed_date, h.price, h.land_size, h.property_type, h.realtor_id,
           h.created_at, h.updated_at
    FROM homes h WHERE h.id = $1
"#;

/// Insert a home owned by a realtor
pub const INSERT_HOME: &str = r#"
    INSERT INTO homes (address, city, number_of_bedrooms, number_of_bathrooms,
                       price, land_size, property_type, realtor_id)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING id, address, city, number_of_bedrooms, number_of_bathrooms,
              listed_date, price, land_size, property_type, realtor_id,
              created_at, updated_at
"#;

/// Insert one image of a home
pub const INSERT_IMAGE: &str = "INSERT INTO images (url, home_id) VALUES ($1, $2)";

/// All image urls of a home, in upload order
pub const LIST_IMAGES: &str = "SELECT url FROM images WHERE home_id = $1 ORDER BY id";

pub const DELETE_IMAGES: &str = "DELETE FROM images WHERE home_id = $1";

pub const DELETE_MESSAGES: &str = "DELETE FROM messages WHERE home_id = $1";

pub const DELETE_HOME: &str = "DELETE FROM homes WHERE id = $1";

/// Contact details of a user
pub const FIND_CONTACT: &str = "SELECT name, email, phone FROM users WHERE id = $1";

/// Store a buyer inquiry
pub const INSERT_MESSAGE: &str = r#"
    INSERT INTO messages (message, home_id, realtor_id, buyer_id)
    VALUES ($1, $2, $3, $4)
    RETURNING id, message, home_id, realtor_id, buyer_id
"#;

/// Inquiries about a home with the buyer's contact details
pub const LIST_MESSAGES_BY_HOME: &str = r#"
    SELECT m.message, u.name, u.email, u.phone
    FROM messages m
    JOIN users u ON u.id = m.buyer_id
    WHERE m.home_id = $1
    ORDER BY m.id
"#;

/// Listing search with the WHERE clause produced by [`home_filter`]
pub fn list_homes_sql(filter: &str) -> String {
    format!(
        "SELECT {}, \
         (SELECT i.url FROM images i WHERE i.home_id = h.id ORDER BY i.id LIMIT 1) AS image \
         FROM homes h {} ORDER BY h.listed_date DESC",
        HOME_COLUMNS, filter
    )
}

/// Partial update; `set` is produced by [`home_update`] and the id is the last parameter
pub fn update_home_sql(set: &str, id_param: usize) -> String {
    format!(
        "UPDATE homes SET {} WHERE id = ${} \
         RETURNING id, address, city, number_of_bedrooms, number_of_bathrooms, \
         listed_date, price, land_size, property_type, realtor_id, created_at, updated_at",
        set, id_param
    )
}

/// A SQL fragment with its positional parameters
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Box<dyn ToSql + Sync + Send>>,
}

impl SqlFragment {
    pub fn param_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }
}

/// Build the WHERE clause for a listing search; empty when no filter is set
pub fn home_filter(query: &HomeQuery) -> SqlFragment {
    let mut clauses = Vec::new();
    let mut params: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();

    if let Some(city) = &query.city {
        params.push(Box::new(city.clone()));
        clauses.push(format!("h.city = ${}", params.len()));
    }
    if let Some(min) = query.min_price {
        params.push(Box::new(min));
        clauses.push(format!("h.price >= ${}", params.len()));
    }
    if let Some(max) = query.max_price {
        params.push(Box::new(max));
        clauses.push(format!("h.price <= ${}", params.len()));
    }
    if let Some(property_type) = query.property_type {
        params.push(Box::new(property_type.as_str().to_string()));
        clauses.push(format!("h.property_type = ${}", params.len()));
    }

    let sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    SqlFragment { sql, params }
}

/// Build the SET list for a partial listing update.
///
/// `updated_at` is always refreshed; placeholders start at `$1`.
pub fn home_update(update: &UpdateHomeRequest) -> SqlFragment {
    let mut sets = Vec::new();
    let mut params: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();

    macro_rules! set {
        ($column:literal, $value:expr) => {
            if let Some(value) = $value {
                params.push(Box::new(value));
                sets.push(format!("{} = ${}", $column, params.len()));
            }
        };
    }

    set!("address", update.address.clone());
    set!("number_of_bedrooms", update.number_of_bedrooms);
    set!("number_of_bathrooms", update.number_of_bathrooms);
    set!("city", update.city.clone());
    set!("price", update.price);
    set!("land_size", update.land_size);
    set!(
        "property_type",
        update.property_type.map(|p| p.as_str().to_string())
    );

    sets.push("updated_at = NOW()".to_string());

    SqlFragment {
        sql: sets.join(", "),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_query_has_no_where_clause() {
        let fragment = home_filter(&HomeQuery::default());
        assert_eq!(fragment.sql, "");
        assert!(fragment.params.is_empty());
    }

    #[test]
    fn all_filters_are_numbered_in_order() {
        let fragment = home_filter(&HomeQuery {
            city: Some("Toronto".to_string()),
            min_price: Some(100_000.0),
            max_price: Some(900_000.0),
            property_type: Some(PropertyType::Condo),
        });

        assert_eq!(
            fragment.sql,
            "WHERE h.city = $1 AND h.price >= $2 AND h.price <= $3 AND h.property_type = $4"
        );
        assert_eq!(fragment.param_refs().len(), 4);
    }

    #[test]
    fn price_range_only() {
        let fragment = home_filter(&HomeQuery {
            max_price: Some(500.0),
            ..Default::default()
        });
        assert_eq!(fragment.sql, "WHERE h.price <= $1");
        assert_eq!(fragment.params.len(), 1);
    }

    #[test]
    fn list_sql_embeds_filter() {
        let sql = list_homes_sql("WHERE h.city = $1");
        assert!(sql.contains("FROM homes h WHERE h.city = $1 ORDER BY"));
        assert!(sql.contains("LIMIT 1) AS image"));
    }

    #[test]
    fn update_sql_puts_id_last() {
        let sql = update_home_sql("price = $1, updated_at = NOW()", 2);
        assert!(sql.starts_with("UPDATE homes SET price = $1, updated_at = NOW() WHERE id = $2"));
    }

    #[test]
    fn update_sets_only_provided_fields() {
        let fragment = home_update(&UpdateHomeRequest {
            price: Some(10.0),
            city: Some("Ottawa".to_string()),
            ..Default::default()
        });

        assert_eq!(fragment.sql, "city = $1, price = $2, updated_at = NOW()");
        assert_eq!(fragment.params.len(), 2);
    }
}
