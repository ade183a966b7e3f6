use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use wayfarer_core::MemberId;

/// The header identifying the acting member
pub const MEMBER_HEADER: &str = "x-member-id";

/// The member making the request, if they identified themselves
pub struct Member(pub Option<MemberId>);

#[async_trait]
impl<S> FromRequestParts<S> for Member
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(MEMBER_HEADER) else {
            return Ok(Self(None));
        };

        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<MemberId>().ok())
            .map(|id| Self(Some(id)))
            .ok_or((StatusCode::BAD_REQUEST, "X-Member-Id must be a number"))
    }
}
