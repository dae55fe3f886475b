//! Cascading report filters.
//!
//! Each filter's options are derived from the records matching the other two
//! selections. Everything here is a pure function of the roster and the
//! current selection; nothing is cached.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::EmployeeRecord;

/// Current filter selection. `None` means "All".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub camp: Option<String>,
}

impl ReportFilter {
    /// Build a filter from raw UI values, where empty or `All` means no filter.
    pub fn from_params(
        meal_type: Option<String>,
        company: Option<String>,
        camp: Option<String>,
    ) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty() && v != "All")
        }
        Self {
            meal_type: clean(meal_type),
            company: clean(company),
            camp: clean(camp),
        }
    }
}

/// Selectable values for each filter, sorted and de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub meals: Vec<String>,
    pub companies: Vec<String>,
    pub camps: Vec<String>,
}

fn matches(selected: &Option<String>, value: &str) -> bool {
    selected.as_deref().map_or(true, |s| s == value)
}

fn distinct<'a, I>(values: I) -> Vec<String>
where
    I: Iterator<Item = &'a str>,
{
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Compute the options for each filter given the other two selections.
pub fn filter_options(records: &[EmployeeRecord], filter: &ReportFilter) -> FilterOptions {
    let meals = distinct(
        records
            .iter()
            .filter(|e| matches(&filter.company, &e.company_name))
            .filter(|e| matches(&filter.camp, &e.camp_allocation))
            .map(|e| e.meal_type.as_str()),
    );
    let companies = distinct(
        records
            .iter()
            .filter(|e| matches(&filter.meal_type, &e.meal_type))
            .filter(|e| matches(&filter.camp, &e.camp_allocation))
            .map(|e| e.company_name.as_str()),
    );
    let camps = distinct(
        records
            .iter()
            .filter(|e| matches(&filter.company, &e.company_name))
            .filter(|e| matches(&filter.meal_type, &e.meal_type))
            .map(|e| e.camp_allocation.as_str()),
    );

    FilterOptions {
        meals,
        companies,
        camps,
    }
}

/// Drop selections that are no longer offered.
pub fn reconcile(filter: ReportFilter, options: &FilterOptions) -> ReportFilter {
    fn keep(selected: Option<String>, offered: &[String]) -> Option<String> {
        selected.filter(|s| offered.contains(s))
    }
    ReportFilter {
        meal_type: keep(filter.meal_type, &options.meals),
        company: keep(filter.company, &options.companies),
        camp: keep(filter.camp, &options.camps),
    }
}

/// Records matching every selection, in roster order.
pub fn apply<'a>(records: &'a [EmployeeRecord], filter: &ReportFilter) -> Vec<&'a EmployeeRecord> {
    records
        .iter()
        .filter(|e| {
            matches(&filter.meal_type, &e.meal_type)
                && matches(&filter.company, &e.company_name)
                && matches(&filter.camp, &e.camp_allocation)
        })
        .collect()
}

/// Options computed from a selection, and the selection reconciled against
/// them until it is stable. One reset can shrink another filter's options, so
/// this iterates; it terminates because each pass only clears selections.
pub fn resolve(records: &[EmployeeRecord], filter: ReportFilter) -> (FilterOptions, ReportFilter) {
    let mut filter = filter;
    loop {
        let options = filter_options(records, &filter);
        let next = reconcile(filter.clone(), &options);
        if next == filter {
            return (options, filter);
        }
        filter = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(meal: &str, company: &str, camp: &str) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: format!("{}-{}-{}", meal, company, camp),
            employee_name: "Someone".to_string(),
            meal_type: meal.to_string(),
            company_name: company.to_string(),
            camp_allocation: camp.to_string(),
            access_card: "Active".to_string(),
            card_number: String::new(),
        }
    }

    fn roster() -> Vec<EmployeeRecord> {
        vec![
            record("Veg", "Acme", "North"),
            record("Non-Veg", "Acme", "South"),
            record("Veg", "Globex", "South"),
            record("Halal", "Initech", "East"),
            record("", "Initech", "East"),
        ]
    }

    fn select(meal: Option<&str>, company: Option<&str>, camp: Option<&str>) -> ReportFilter {
        ReportFilter {
            meal_type: meal.map(str::to_string),
            company: company.map(str::to_string),
            camp: camp.map(str::to_string),
        }
    }

    #[test]
    fn test_unfiltered_options_are_sorted_and_distinct() {
        let options = filter_options(&roster(), &ReportFilter::default());
        assert_eq!(options.meals, vec!["Halal", "Non-Veg", "Veg"]);
        assert_eq!(options.companies, vec!["Acme", "Globex", "Initech"]);
        assert_eq!(options.camps, vec!["East", "North", "South"]);
    }

    #[test]
    fn test_options_cascade_from_other_selections() {
        let options = filter_options(&roster(), &select(None, Some("Acme"), None));
        assert_eq!(options.meals, vec!["Non-Veg", "Veg"]);
        assert_eq!(options.camps, vec!["North", "South"]);
        // A filter's own selection does not narrow its own options.
        assert_eq!(options.companies, vec!["Acme", "Globex", "Initech"]);
    }

    #[test]
    fn test_reconcile_resets_unavailable_selection() {
        let records = roster();
        let filter = select(Some("Halal"), Some("Acme"), None);
        let options = filter_options(&records, &filter);
        let reconciled = reconcile(filter, &options);
        assert_eq!(reconciled.meal_type, None);
        assert_eq!(reconciled.company, None);
    }

    #[test]
    fn test_resolve_reaches_fixed_point() {
        let records = roster();
        let (options, filter) = resolve(&records, select(Some("Veg"), None, Some("South")));
        assert_eq!(filter, select(Some("Veg"), None, Some("South")));
        assert_eq!(options.companies, vec!["Globex"]);
    }

    #[test]
    fn test_apply_filters_in_roster_order() {
        let records = roster();
        let matched = apply(&records, &select(Some("Veg"), None, None));
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].company_name, "Acme");
        assert_eq!(matched[1].company_name, "Globex");
        assert_eq!(apply(&records, &ReportFilter::default()).len(), 5);
    }

    #[test]
    fn test_from_params_treats_all_as_unset() {
        let filter = ReportFilter::from_params(
            Some("All".to_string()),
            Some(String::new()),
            Some("North".to_string()),
        );
        assert_eq!(filter, select(None, None, Some("North")));
    }
}
