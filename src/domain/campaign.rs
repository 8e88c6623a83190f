use serde::Serialize;

use crate::domain::numeric::extract_number;

/// Goal used when the caller does not supply one.
pub const DEFAULT_GOAL: f64 = 25_000.0;

/// Raw field texts pulled out of a campaign page, each possibly empty.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawCampaignFields {
    pub amount_raised: String,
    pub supporters: String,
    pub days_left: String,
}

/// One fully derived view of a campaign's progress. Immutable once built;
/// `percentage` is always computed here, never scraped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignSnapshot {
    pub amount_raised: f64,
    pub goal: f64,
    pub supporters: u32,
    pub days_left: u32,
    pub percentage: f64,
}

#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    #[error("amount not found")]
    AmountNotFound,
}

/// Normalizes the scraped texts and assembles the snapshot.
///
/// The raised amount is the one mandatory field: a campaign snapshot without
/// it is not worth rendering, so a normalized 0 is an error. Supporters and
/// days left are best-effort and default to 0. The percentage is capped at
/// 100 and rounded to one decimal.
pub fn build_snapshot(
    fields: &RawCampaignFields,
    goal: f64,
) -> Result<CampaignSnapshot, ExtractionError> {
    let amount_raised = extract_number(&fields.amount_raised);
    if amount_raised == 0.0 {
        return Err(ExtractionError::AmountNotFound);
    }

    let supporters = extract_number(&fields.supporters) as u32;
    let days_left = extract_number(&fields.days_left) as u32;

    let percentage = match goal > 0.0 {
        true => ((amount_raised / goal * 100.0).min(100.0) * 10.0).round() / 10.0,
        false => 0.0,
    };

    Ok(CampaignSnapshot {
        amount_raised,
        goal,
        supporters,
        days_left,
        percentage,
    })
}
