use crate::{CoreError, CoreResult, MemberId};

/// The currency used when an origin is unknown
pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_LOCALE: &str = "en";

/// Who is acting, and in which context.
///
/// Every operation that depends on the current member takes this explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    member: Option<MemberId>,
    currency: String,
    locale: String,
}

impl Session {
    pub fn new(member_id: MemberId) -> Self {
        Self {
            member: Some(member_id),
            ..Self::anonymous()
        }
    }

    /// A session without a known member. Anything that writes on behalf of a member fails.
    pub fn anonymous() -> Self {
        Self {
            member: None,
            currency: DEFAULT_CURRENCY.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    pub fn with_member(mut self, member_id: Option<MemberId>) -> Self {
        self.member = member_id;
        self
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    /// Derives the currency from where the group travels from.
    pub fn for_origin(self, origin: &str) -> Self {
        self.with_currency(currency_for_origin(origin))
    }

    pub fn member(&self) -> Option<MemberId> {
        self.member
    }

    /// Returns the acting member, or fails if there is none.
    pub fn member_id(&self) -> CoreResult<MemberId> {
        self.member.ok_or(CoreError::Unauthenticated)
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}

const EURO_COUNTRIES: [&str; 14] = [
    "austria",
    "belgium",
    "croatia",
    "finland",
    "france",
    "germany",
    "greece",
    "ireland",
    "italy",
    "luxembourg",
    "netherlands",
    "portugal",
    "slovenia",
    "spain",
];

/// Guesses the currency from the country at the end of an origin like "Lyon, France".
pub fn currency_for_origin(origin: &str) -> &'static str {
    let country = origin
        .rsplit(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    if EURO_COUNTRIES.contains(&country.as_str()) {
        return "EUR";
    }

    match country.as_str() {
        "united kingdom" | "uk" | "england" | "scotland" | "wales" => "GBP",
        "norway" => "NOK",
        "sweden" => "SEK",
        "denmark" => "DKK",
        "switzerland" => "CHF",
        "japan" => "JPY",
        "canada" => "CAD",
        "australia" => "AUD",
        "new zealand" => "NZD",
        "india" => "INR",
        "mexico" => "MXN",
        "brazil" => "BRL",
        _ => DEFAULT_CURRENCY,
    }
}
