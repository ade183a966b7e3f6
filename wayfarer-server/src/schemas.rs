use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::Validate;
use wayfarer_core::{answers::Edit, GroupUpdate, NewGroup, SuggestionId, VoteDirection};

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewGroupSchema {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 256))]
    pub origin: String,
    #[validate(length(min = 1, max = 256))]
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(range(min = 1, max = 100))]
    pub group_size: u32,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateGroupSchema {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 100))]
    pub group_size: Option<u32>,
    /// Must be true to change the destination, which reopens every room
    #[serde(default)]
    pub confirm_reset: bool,
}

/// A single interaction with a question's input
#[derive(Debug, ToSchema, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", deny_unknown_fields)]
pub enum EditSchema {
    Select { value: String },
    Min { value: Option<f64> },
    Max { value: Option<f64> },
    Clear,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VoteSchema {
    pub suggestion_id: SuggestionId,
    #[schema(value_type = String, example = "up")]
    pub direction: VoteDirection,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LockSchema {
    #[validate(length(min = 1, max = 32))]
    pub suggestion_ids: Vec<SuggestionId>,
}

impl From<NewGroupSchema> for NewGroup {
    fn from(value: NewGroupSchema) -> Self {
        Self {
            name: value.name,
            origin: value.origin,
            destination: value.destination,
            start_date: value.start_date,
            end_date: value.end_date,
            group_size: value.group_size,
        }
    }
}

impl From<UpdateGroupSchema> for GroupUpdate {
    fn from(value: UpdateGroupSchema) -> Self {
        Self {
            name: value.name,
            destination: value.destination,
            start_date: value.start_date,
            end_date: value.end_date,
            group_size: value.group_size,
        }
    }
}

impl From<EditSchema> for Edit {
    fn from(value: EditSchema) -> Self {
        match value {
            EditSchema::Select { value } => Edit::Select(value),
            EditSchema::Min { value } => Edit::Min(value),
            EditSchema::Max { value } => Edit::Max(value),
            EditSchema::Clear => Edit::Clear,
        }
    }
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}
