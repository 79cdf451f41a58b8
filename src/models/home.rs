//! Home listing, image and inquiry models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PropertyType {
    Residential,
    Condo,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Residential => "RESIDENTIAL",
            PropertyType::Condo => "CONDO",
        }
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESIDENTIAL" => Ok(PropertyType::Residential),
            "CONDO" => Ok(PropertyType::Condo),
            other => Err(format!("Unknown property type: {}", other)),
        }
    }
}

/// Home record from database
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    pub id: i32,
    pub address: String,
    pub city: String,
    pub number_of_bedrooms: i32,
    pub number_of_bathrooms: f64,
    pub listed_date: DateTime<Utc>,
    pub price: f64,
    pub land_size: f64,
    pub property_type: PropertyType,
    pub realtor_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing entry returned by searches: the home plus its first image
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSummary {
    pub id: i32,
    pub address: String,
    pub city: String,
    pub number_of_bedrooms: i32,
    pub number_of_bathrooms: f64,
    pub listed_date: DateTime<Utc>,
    pub price: f64,
    pub land_size: f64,
    pub property_type: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl HomeSummary {
    pub fn from_home(home: Home, image: Option<String>) -> Self {
        Self {
            id: home.id,
            address: home.address,
            city: home.city,
            number_of_bedrooms: home.number_of_bedrooms,
            number_of_bathrooms: home.number_of_bathrooms,
            listed_date: home.listed_date,
            price: home.price,
            land_size: home.land_size,
            property_type: home.property_type,
            image,
        }
    }
}

/// Public contact details of a realtor or buyer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Full listing: every image plus the realtor's contact
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeDetail {
    #[serde(flatten)]
    pub home: HomeSummary,
    pub images: Vec<String>,
    pub realtor: Contact,
}

/// Query parameters for listing homes
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeQuery {
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub property_type: Option<PropertyType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImageInput {
    #[validate(length(min = 1, message = "Image url is required"))]
    pub url: String,
}

/// Request to create a listing
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHomeRequest {
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(range(min = 0, message = "Number of bedrooms cannot be negative"))]
    pub number_of_bedrooms: i32,
    #[validate(range(min = 0.0, message = "Number of bathrooms cannot be negative"))]
    pub number_of_bathrooms: f64,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(range(exclusive_min = 0.0, message = "Price must be positive"))]
    pub price: f64,
    #[validate(range(exclusive_min = 0.0, message = "Land size must be positive"))]
    pub land_size: f64,
    pub property_type: PropertyType,
    #[validate(length(min = 1, message = "At least one image is required"))]
    #[validate(nested)]
    pub images: Vec<ImageInput>,
}

/// Partial update of a listing
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHomeRequest {
    #[validate(length(min = 1, message = "Address cannot be empty"))]
    pub address: Option<String>,
    #[validate(range(min = 0, message = "Number of bedrooms cannot be negative"))]
    pub number_of_bedrooms: Option<i32>,
    #[validate(range(min = 0.0, message = "Number of bathrooms cannot be negative"))]
    pub number_of_bathrooms: Option<f64>,
    #[validate(length(min = 1, message = "City cannot be empty"))]
    pub city: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Price must be positive"))]
    pub price: Option<f64>,
    #[validate(range(exclusive_min = 0.0, message = "Land size must be positive"))]
    pub land_size: Option<f64>,
    pub property_type: Option<PropertyType>,
}

impl UpdateHomeRequest {
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.number_of_bedrooms.is_none()
            && self.number_of_bathrooms.is_none()
            && self.city.is_none()
            && self.price.is_none()
            && self.land_size.is_none()
            && self.property_type.is_none()
    }
}

/// Buyer inquiry about a listing
#[derive(Debug, Deserialize, Validate)]
pub struct InquireRequest {
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

/// Stored inquiry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i32,
    pub message: String,
    pub home_id: i32,
    pub realtor_id: i32,
    pub buyer_id: i32,
}

/// Inquiry as shown to the realtor
#[derive(Debug, Clone, Serialize)]
pub struct Inquiry {
    pub message: String,
    pub buyer: Contact,
}
