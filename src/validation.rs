use crate::error::ValidationError;
use crate::filters::MAX_RATING;
use crate::models::{ImportCoffee, ImportNote, ImportRoaster};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 2000;
const MAX_ALTITUDE: i64 = 5000;
const MAX_NOTES: usize = 10;

/// Validator for imported catalog data.
pub struct Validator;

impl Validator {
    fn validate_name(entity: &'static str, name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::NameRequired(entity));
        }
        Ok(())
    }

    fn validate_len(
        field: &'static str,
        value: Option<&str>,
        max: usize,
    ) -> Result<(), ValidationError> {
        match value {
            Some(v) if v.chars().count() > max => Err(ValidationError::TooLong { field, max }),
            _ => Ok(()),
        }
    }

    pub fn validate_note(note: &ImportNote) -> Result<(), ValidationError> {
        Self::validate_name("Note", &note.name)?;
        Self::validate_len("Note name", Some(&note.name), MAX_NAME_LEN)?;
        Self::validate_len("Category", note.category.as_deref(), 50)?;
        Ok(())
    }

    pub fn validate_roaster(roaster: &ImportRoaster) -> Result<(), ValidationError> {
        Self::validate_name("Roaster", &roaster.name)?;
        Self::validate_len("Roaster name", Some(&roaster.name), MAX_NAME_LEN)?;
        Self::validate_len("Description", roaster.description.as_deref(), 1000)?;
        Self::validate_len("Location", roaster.location.as_deref(), 100)?;
        Self::validate_len("Website URL", roaster.website.as_deref(), 500)?;
        Ok(())
    }

    /// Validate altitude bounds. Each must be in `0..=5000` and min <= max.
    pub fn validate_altitude(min: Option<i64>, max: Option<i64>) -> Result<(), ValidationError> {
        for altitude in [min, max].into_iter().flatten() {
            if !(0..=MAX_ALTITUDE).contains(&altitude) {
                return Err(ValidationError::InvalidAltitude(altitude));
            }
        }
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(ValidationError::AltitudeRange);
            }
        }
        Ok(())
    }

    /// One to four euro signs.
    pub fn validate_price_range(price_range: &Option<String>) -> Result<(), ValidationError> {
        if let Some(p) = price_range {
            let len = p.chars().count();
            if !(1..=4).contains(&len) || p.chars().any(|c| c != '€') {
                return Err(ValidationError::InvalidPriceRange);
            }
        }
        Ok(())
    }

    pub fn validate_rating(rating: Option<f64>) -> Result<(), ValidationError> {
        match rating {
            Some(r) if !r.is_finite() || !(0.0..=MAX_RATING).contains(&r) => {
                Err(ValidationError::InvalidRating(r))
            }
            _ => Ok(()),
        }
    }

    pub fn validate_coffee(coffee: &ImportCoffee) -> Result<(), ValidationError> {
        Self::validate_name("Coffee", &coffee.name)?;
        if !(3..=255).contains(&coffee.name.trim().chars().count()) {
            return Err(ValidationError::CoffeeNameLength);
        }
        if coffee.roaster_id.is_none()
            && coffee.roaster_name.as_deref().map_or(true, |n| n.trim().is_empty())
        {
            return Err(ValidationError::RoasterRequired);
        }
        Self::validate_len("Origin", coffee.origin.as_deref(), 100)?;
        Self::validate_len("Process", coffee.process.as_deref(), 50)?;
        Self::validate_len("Variety", coffee.variety.as_deref(), 100)?;
        Self::validate_len("Description", coffee.description.as_deref(), MAX_DESCRIPTION_LEN)?;
        Self::validate_altitude(coffee.altitude_min, coffee.altitude_max)?;
        if let Some(year) = coffee.harvest_year {
            if year < 2000 {
                return Err(ValidationError::InvalidHarvestYear(year));
            }
        }
        Self::validate_price_range(&coffee.price_range)?;
        if !(1..=MAX_NOTES).contains(&coffee.note_names.len()) {
            return Err(ValidationError::NoteCount(coffee.note_names.len()));
        }
        Self::validate_rating(coffee.average_rating)?;
        if let Some(count) = coffee.review_count {
            if count < 0 {
                return Err(ValidationError::InvalidReviewCount(count));
            }
        }
        Ok(())
    }
}
