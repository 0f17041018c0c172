//! crates/mentorconnect_core/src/rating.rs
//!
//! Mentor rating aggregation and feedback statistics.
//!
//! The headline rating is recomputed from the full feedback set on every
//! write rather than maintained incrementally, which keeps it idempotent.

use std::collections::BTreeMap;

use crate::domain::{CategoryRatings, Feedback, MAX_RATING, MIN_RATING};
use crate::ports::{PortError, PortResult};

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Arithmetic mean rounded to one decimal; `0.0` for an empty set.
pub fn aggregate_rating<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = i16>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0i64, 0u64), |(sum, count), r| (sum + i64::from(r), count + 1));
    if count == 0 {
        return 0.0;
    }
    round_one_decimal(sum as f64 / count as f64)
}

pub fn validate_rating(rating: i16, field: &str) -> PortResult<()> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(PortError::Validation(format!(
            "{field} must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )))
    }
}

pub fn validate_categories(categories: &CategoryRatings) -> PortResult<()> {
    let named = [
        ("communication", categories.communication),
        ("knowledge", categories.knowledge),
        ("helpfulness", categories.helpfulness),
        ("professionalism", categories.professionalism),
    ];
    for (field, value) in named {
        if let Some(v) = value {
            validate_rating(v, field)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CategoryAverages {
    pub communication: f64,
    pub knowledge: f64,
    pub helpfulness: f64,
    pub professionalism: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackStats {
    pub total_feedback: u64,
    pub average_rating: f64,
    /// Count per star value; always holds keys 1 through 5.
    pub rating_distribution: BTreeMap<i16, u64>,
    pub category_averages: CategoryAverages,
}

pub fn feedback_stats(feedback: &[Feedback]) -> FeedbackStats {
    let mut rating_distribution: BTreeMap<i16, u64> =
        (MIN_RATING..=MAX_RATING).map(|star| (star, 0)).collect();
    for f in feedback {
        *rating_distribution.entry(f.rating).or_insert(0) += 1;
    }

    let category = |pick: fn(&CategoryRatings) -> Option<i16>| {
        aggregate_rating(feedback.iter().filter_map(|f| pick(&f.categories)))
    };

    FeedbackStats {
        total_feedback: feedback.len() as u64,
        average_rating: aggregate_rating(feedback.iter().map(|f| f.rating)),
        rating_distribution,
        category_averages: CategoryAverages {
            communication: category(|c| c.communication),
            knowledge: category(|c| c.knowledge),
            helpfulness: category(|c| c.helpfulness),
            professionalism: category(|c| c.professionalism),
        },
    }
}
