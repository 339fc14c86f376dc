use biopulse_common::{Briefing, BriefingItem, SchemaError};
use chrono::NaiveDate;

/// Structural gate in front of the writer. A briefing that fails any check
/// here is not publishable as-is; the caller decides whether to degrade.
pub struct SchemaValidator {
    max_items: usize,
}

impl SchemaValidator {
    pub fn new(max_items: usize) -> Self {
        Self { max_items }
    }

    pub fn validate(&self, briefing: &Briefing) -> Result<(), SchemaError> {
        check_date("briefing", "date", &briefing.date)?;

        if briefing.items.len() > self.max_items {
            return Err(SchemaError::TooManyItems {
                count: briefing.items.len(),
                limit: self.max_items,
            });
        }

        for item in &briefing.items {
            self.validate_item(item)?;
        }
        Ok(())
    }

    fn validate_item(&self, item: &BriefingItem) -> Result<(), SchemaError> {
        for (field, value) in [
            ("id", &item.id),
            ("headline", &item.headline),
            ("preview", &item.preview),
            ("article", &item.article),
        ] {
            if value.trim().is_empty() {
                return Err(SchemaError::EmptyField {
                    id: item.id.clone(),
                    field,
                });
            }
            if value.contains('\n') || value.contains('\r') {
                return Err(SchemaError::LiteralLineBreak {
                    id: item.id.clone(),
                    field,
                });
            }
        }

        if item.sources.is_empty() {
            return Err(SchemaError::NoSources {
                id: item.id.clone(),
            });
        }

        for source in &item.sources {
            if !source.source_type.is_emittable() {
                return Err(SchemaError::DisallowedSourceType {
                    id: item.id.clone(),
                    found: source.source_type.to_string(),
                });
            }
            check_date(&item.id, "verified_date", &source.verified_date)?;
        }
        Ok(())
    }
}

fn check_date(id: &str, field: &'static str, value: &str) -> Result<(), SchemaError> {
    let ok = value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();
    if ok {
        Ok(())
    } else {
        Err(SchemaError::BadDate {
            id: id.to_string(),
            field,
            value: value.to_string(),
        })
    }
}
