//! Prediction Route

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use data_cleaner::{RawRecord, Value};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

/// External field names of the prediction body, in declaration order
pub const FIELDS: [&str; 19] = [
    "gender",
    "seniorCitizen",
    "partner",
    "dependents",
    "tenure",
    "phoneService",
    "multipleLines",
    "internetService",
    "onlineSecurity",
    "onlineBackup",
    "deviceProtection",
    "techSupport",
    "streamingTV",
    "streamingMovies",
    "contract",
    "paperlessBilling",
    "paymentMethod",
    "monthlyCharges",
    "totalCharges",
];

/// Yes/No answer; clients send text, 0/1 or booleans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YesNo {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl YesNo {
    /// Category label as it appears in training data
    fn into_value(self) -> Value {
        match self {
            YesNo::Flag(true) | YesNo::Number(1) => Value::from("Yes"),
            YesNo::Flag(false) | YesNo::Number(0) => Value::from("No"),
            // Other numbers encode as an unseen category
            YesNo::Number(n) => Value::Text(n.to_string()),
            YesNo::Text(s) => Value::Text(s),
        }
    }
}

/// Prediction request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerData {
    pub gender: String,
    pub senior_citizen: i64,
    pub partner: YesNo,
    pub dependents: YesNo,
    pub tenure: i64,
    pub phone_service: YesNo,
    pub multiple_lines: String,
    pub internet_service: String,
    pub online_security: String,
    pub online_backup: String,
    pub device_protection: String,
    pub tech_support: String,
    #[serde(rename = "streamingTV")]
    pub streaming_tv: String,
    pub streaming_movies: String,
    pub contract: String,
    pub paperless_billing: YesNo,
    pub payment_method: String,
    pub monthly_charges: f64,
    /// Left raw: blank strings are rejected by the cleaner, not the decoder
    pub total_charges: Value,
}

impl From<CustomerData> for RawRecord {
    fn from(data: CustomerData) -> Self {
        RawRecord::new()
            .with("gender", data.gender)
            .with("seniorCitizen", data.senior_citizen)
            .with("partner", data.partner.into_value())
            .with("dependents", data.dependents.into_value())
            .with("tenure", data.tenure)
            .with("phoneService", data.phone_service.into_value())
            .with("multipleLines", data.multiple_lines)
            .with("internetService", data.internet_service)
            .with("onlineSecurity", data.online_security)
            .with("onlineBackup", data.online_backup)
            .with("deviceProtection", data.device_protection)
            .with("techSupport", data.tech_support)
            .with("streamingTV", data.streaming_tv)
            .with("streamingMovies", data.streaming_movies)
            .with("contract", data.contract)
            .with("paperlessBilling", data.paperless_billing.into_value())
            .with("paymentMethod", data.payment_method)
            .with("monthlyCharges", data.monthly_charges)
            .with("totalCharges", data.total_charges)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub churn_prediction: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CustomerData>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let result = body
        .map_err(ApiError::from)
        .and_then(|Json(data)| {
            let context = state.context.current();
            context
                .predict(&RawRecord::from(data))
                .map_err(ApiError::from)
        });

    match result {
        Ok(prediction) => {
            counter!("churn_predictions_total", "label" => prediction.label.to_string())
                .increment(1);
            Ok(Json(PredictionResponse {
                churn_prediction: prediction.label,
                probability: prediction.probability,
            }))
        }
        Err(e) => {
            counter!("churn_prediction_errors_total", "kind" => e.kind()).increment(1);
            Err(e)
        }
    }
}
