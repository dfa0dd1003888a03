//! Market Models
//! Mission: Stall and booking records plus their endpoint schemas

use serde::{Deserialize, Serialize};

/// Market stall
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stall {
    pub id: i64,
    pub stall_number: String,
    pub size: String,
    pub price_per_day: f64,
    pub status: StallStatus,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StallStatus {
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "booked")]
    Booked,
    #[serde(rename = "occupied")]
    Occupied,
}

impl StallStatus {
    pub fn as_str(&self) -> &str {
        match self {
            StallStatus::Available => "available",
            StallStatus::Booked => "booked",
            StallStatus::Occupied => "occupied",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "available" => Some(StallStatus::Available),
            "booked" => Some(StallStatus::Booked),
            "occupied" => Some(StallStatus::Occupied),
            _ => None,
        }
    }
}

/// Stall booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: String,
    pub stall_id: i64,
    pub start_date: String,
    pub end_date: String,
    pub status: BookingStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

/// Stall creation request (admin)
#[derive(Debug, Deserialize)]
pub struct CreateStallRequest {
    pub stall_number: String,
    pub size: String,
    pub price_per_day: f64,
    pub image_url: Option<String>,
}

/// Stall update request (admin); absent fields are left unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateStallRequest {
    pub stall_number: Option<String>,
    pub size: Option<String>,
    pub price_per_day: Option<f64>,
    pub status: Option<StallStatus>,
    pub image_url: Option<String>,
}

/// Booking creation request
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub stall_id: i64,
    pub start_date: String,
    pub end_date: String,
}

/// Booking status update request (admin)
#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}
