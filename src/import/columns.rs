//! Spreadsheet header → seed field resolution.
//!
//! Headers are compared after lowercasing and dropping spaces, underscores and
//! hyphens, so "Date Finished", "date_finished" and "DATE-FINISHED" are the same.

use serde::Serialize;

use std::collections::BTreeMap;

use super::data::ColumnOverrides;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeedField {
    Type,
    Name,
    PacketsMade,
    SeedSource,
    DateOrdered,
    DateFinished,
    DateCataloged,
    DateRanOut,
    AmountText,
}

impl SeedField {
    pub const ALL: [SeedField; 9] = [
        SeedField::Type,
        SeedField::Name,
        SeedField::PacketsMade,
        SeedField::SeedSource,
        SeedField::DateOrdered,
        SeedField::DateFinished,
        SeedField::DateCataloged,
        SeedField::DateRanOut,
        SeedField::AmountText,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SeedField::Type => "Type",
            SeedField::Name => "Name",
            SeedField::PacketsMade => "packets_made",
            SeedField::SeedSource => "seed_source",
            SeedField::DateOrdered => "date_ordered",
            SeedField::DateFinished => "date_finished",
            SeedField::DateCataloged => "date_cataloged",
            SeedField::DateRanOut => "date_ran_out",
            SeedField::AmountText => "amount_text",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, SeedField::Type | SeedField::Name)
    }

    /// Normalized header spellings accepted for this field, most specific first.
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            SeedField::Type => &["type", "seedtype", "category", "kind"],
            SeedField::Name => &["name", "seedname", "variety", "seed", "plantname", "commonname"],
            SeedField::PacketsMade => &["packetsmade", "packets", "numpackets", "packetcount", "numberofpackets"],
            SeedField::SeedSource => &["seedsource", "source", "supplier", "vendor", "origin"],
            SeedField::DateOrdered => &["dateordered", "ordered", "orderdate", "orderedon"],
            SeedField::DateFinished => &["datefinished", "finished", "finishdate", "finishedon"],
            SeedField::DateCataloged => &[
                "datecataloged",
                "datecatalogued",
                "cataloged",
                "catalogued",
                "catalogdate",
            ],
            SeedField::DateRanOut => &["dateranout", "ranout", "ranoutdate", "outofstock", "dateempty"],
            SeedField::AmountText => &["amounttext", "amount", "quantity", "qty", "amountleft"],
        }
    }

    fn override_column<'a>(&self, overrides: &'a ColumnOverrides) -> Option<&'a str> {
        let column = match self {
            SeedField::Type => &overrides.type_column,
            SeedField::Name => &overrides.name_column,
            SeedField::PacketsMade => &overrides.packets_made_column,
            SeedField::SeedSource => &overrides.seed_source_column,
            SeedField::DateOrdered => &overrides.date_ordered_column,
            SeedField::DateFinished => &overrides.date_finished_column,
            SeedField::DateCataloged => &overrides.date_cataloged_column,
            SeedField::DateRanOut => &overrides.date_ran_out_column,
            SeedField::AmountText => &overrides.amount_text_column,
        };
        column.as_deref().map(str::trim).filter(|column| !column.is_empty())
    }
}

pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Field → column index into the sheet's header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: BTreeMap<SeedField, usize>,
}

impl ColumnMapping {
    pub fn column(&self, field: SeedField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn insert(&mut self, field: SeedField, column: usize) {
        self.columns.insert(field, column);
    }

    /// Field label → header text, for reporting back to the caller.
    pub fn describe(&self, headers: &[String]) -> BTreeMap<String, String> {
        self.columns
            .iter()
            .filter_map(|(field, column)| {
                headers
                    .get(*column)
                    .map(|header| (field.label().to_string(), header.clone()))
            })
            .collect()
    }
}

/// Picks a column for each field through the synonym table. A header is used
/// for at most one field.
pub fn resolve_columns(headers: &[String]) -> ColumnMapping {
    let normalized: Vec<String> = headers.iter().map(|header| normalize_header(header)).collect();
    let mut mapping = ColumnMapping::default();
    let mut taken = vec![false; headers.len()];

    for field in SeedField::ALL {
        let found = field.synonyms().iter().find_map(|synonym| {
            normalized
                .iter()
                .enumerate()
                .find(|(index, header)| !taken[*index] && header.as_str() == *synonym)
                .map(|(index, _)| index)
        });

        if let Some(index) = found {
            taken[index] = true;
            mapping.insert(field, index);
        }
    }

    mapping
}

/// Synonym resolution with caller overrides applied on top, then validated.
/// Every problem found is returned, not just the first.
pub fn build_mapping(headers: &[String], overrides: &ColumnOverrides) -> Result<ColumnMapping, Vec<String>> {
    let mut mapping = resolve_columns(headers);
    let mut errors = vec![];
    let mut overridden: Vec<SeedField> = vec![];

    for field in SeedField::ALL {
        if let Some(column) = field.override_column(overrides) {
            overridden.push(field);
            match headers.iter().position(|header| header.trim() == column) {
                Some(index) => {
                    // An explicit choice takes the column away from a synonym match.
                    mapping
                        .columns
                        .retain(|other, mapped| overridden.contains(other) || *mapped != index);
                    mapping.insert(field, index);
                }
                None => {
                    mapping.columns.remove(&field);
                    errors.push(format!("Column '{}' was not found for '{}'.", column, field.label()));
                }
            }
        }
    }

    for field in SeedField::ALL {
        if field.is_required() && mapping.column(field).is_none() && field.override_column(overrides).is_none() {
            errors.push(format!("Mapping for required field '{}' is missing.", field.label()));
        }
    }

    let mut seen: BTreeMap<usize, SeedField> = BTreeMap::new();
    for (field, column) in &mapping.columns {
        if seen.insert(*column, *field).is_some() {
            let header = headers.get(*column).map(String::as_str).unwrap_or_default();
            let message = format!(
                "Column '{}' is mapped to multiple fields. Please choose unique columns.",
                header
            );
            if !errors.contains(&message) {
                errors.push(message);
            }
        }
    }

    if errors.is_empty() {
        Ok(mapping)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_header(" Date Ran-Out "), "dateranout");
        assert_eq!(normalize_header("PACKETS_MADE"), "packetsmade");
    }

    #[test]
    fn synonyms_resolve_common_spellings() {
        let headers = headers(&["Seed Name", "Category", "Packets", "Supplier", "Date Finished", "Qty"]);

        let mapping = resolve_columns(&headers);

        assert_eq!(mapping.column(SeedField::Name), Some(0));
        assert_eq!(mapping.column(SeedField::Type), Some(1));
        assert_eq!(mapping.column(SeedField::PacketsMade), Some(2));
        assert_eq!(mapping.column(SeedField::SeedSource), Some(3));
        assert_eq!(mapping.column(SeedField::DateFinished), Some(4));
        assert_eq!(mapping.column(SeedField::AmountText), Some(5));
        assert_eq!(mapping.column(SeedField::DateRanOut), None);
    }

    #[test]
    fn exact_names_win_over_looser_synonyms() {
        let headers = headers(&["Seed", "Name", "Type"]);

        let mapping = resolve_columns(&headers);

        assert_eq!(mapping.column(SeedField::Name), Some(1));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let headers = headers(&["Type", "Notes"]);

        let errors = build_mapping(&headers, &ColumnOverrides::default()).unwrap_err();

        assert_eq!(errors, vec!["Mapping for required field 'Name' is missing.".to_string()]);
    }

    #[test]
    fn override_to_unknown_column_is_reported() {
        let headers = headers(&["Type", "Name"]);
        let overrides = ColumnOverrides {
            type_column: Some("MissingCol".to_string()),
            ..ColumnOverrides::default()
        };

        let errors = build_mapping(&headers, &overrides).unwrap_err();

        assert!(errors.contains(&"Column 'MissingCol' was not found for 'Type'.".to_string()));
    }

    #[test]
    fn one_column_for_two_fields_is_reported() {
        let headers = headers(&["Type", "Name", "Extra"]);
        let overrides = ColumnOverrides {
            type_column: Some("Type".to_string()),
            name_column: Some("Name".to_string()),
            packets_made_column: Some("Type".to_string()),
            ..ColumnOverrides::default()
        };

        let errors = build_mapping(&headers, &overrides).unwrap_err();

        assert_eq!(
            errors,
            vec!["Column 'Type' is mapped to multiple fields. Please choose unique columns.".to_string()]
        );
    }

    #[test]
    fn override_takes_a_column_from_a_synonym_match() {
        let headers = headers(&["Type", "Source", "Name"]);
        let overrides = ColumnOverrides {
            name_column: Some("Source".to_string()),
            ..ColumnOverrides::default()
        };

        let mapping = build_mapping(&headers, &overrides).unwrap();

        assert_eq!(mapping.column(SeedField::Name), Some(1));
        assert_eq!(mapping.column(SeedField::SeedSource), None);
    }

    #[test]
    fn overrides_reach_columns_without_synonyms() {
        let headers = headers(&["Kind", "Common Label", "Stock Note"]);
        let overrides = ColumnOverrides {
            name_column: Some("Common Label".to_string()),
            amount_text_column: Some("Stock Note".to_string()),
            ..ColumnOverrides::default()
        };

        let mapping = build_mapping(&headers, &overrides).unwrap();

        assert_eq!(mapping.column(SeedField::Type), Some(0));
        assert_eq!(mapping.column(SeedField::Name), Some(1));
        assert_eq!(mapping.column(SeedField::AmountText), Some(2));
        assert_eq!(mapping.describe(&headers).get("Name").map(String::as_str), Some("Common Label"));
    }
}
