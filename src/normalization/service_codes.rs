//! Billing-code options for an employee line item.

use serde::{Deserialize, Serialize};

use crate::config::ServiceCodeCatalog;
use crate::models::CanonicalEmployee;

/// A billing code offered to a reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCode {
    /// The billing code.
    pub code: String,
    /// Human-readable label.
    pub label: String,
}

/// Produces the billing codes offered for an employee.
///
/// Soft-fail: an unknown employee gets the default catalog and a code that
/// is not in the catalog is still accepted verbatim.
#[derive(Debug, Clone, Default)]
pub struct ServiceCodeResolver {
    catalog: ServiceCodeCatalog,
}

impl ServiceCodeResolver {
    /// Creates a resolver over the given default catalog.
    pub fn new(catalog: &ServiceCodeCatalog) -> Self {
        Self {
            catalog: catalog.clone(),
        }
    }

    /// Returns the employee's qualified codes, most recently used first,
    /// or the default catalog when the employee is unknown or has none.
    ///
    /// # Example
    ///
    /// ```
    /// use timesheet_engine::normalization::ServiceCodeResolver;
    ///
    /// let resolver = ServiceCodeResolver::default();
    /// let codes = resolver.codes_for(None);
    /// assert_eq!(codes[0].code, "T1019");
    /// ```
    pub fn codes_for(&self, employee: Option<&CanonicalEmployee>) -> Vec<ServiceCode> {
        match employee {
            Some(employee) if !employee.qualified_service_codes.is_empty() => employee
                .qualified_service_codes
                .iter()
                .map(|code| ServiceCode {
                    code: code.clone(),
                    label: self.label_for(code).unwrap_or(code.as_str()).to_string(),
                })
                .collect(),
            _ => self
                .catalog
                .service_codes
                .iter()
                .map(|definition| ServiceCode {
                    code: definition.code.clone(),
                    label: definition.label.clone(),
                })
                .collect(),
        }
    }

    /// Accepts a reviewer-entered code. Custom codes are never rejected.
    pub fn accept_custom(&self, raw: &str) -> String {
        raw.trim().to_string()
    }

    /// Looks up the catalog label for a code.
    pub fn label_for(&self, code: &str) -> Option<&str> {
        self.catalog
            .service_codes
            .iter()
            .find(|definition| definition.code.eq_ignore_ascii_case(code.trim()))
            .map(|definition| definition.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn employee_with_codes(codes: &[&str]) -> CanonicalEmployee {
        CanonicalEmployee {
            id: "emp_001".to_string(),
            organization_id: "org_a".to_string(),
            full_name: "Jon Smith".to_string(),
            aliases: BTreeSet::new(),
            qualified_service_codes: codes.iter().map(|c| c.to_string()).collect(),
            is_complete: true,
            active: true,
        }
    }

    #[test]
    fn test_unknown_employee_gets_default_catalog() {
        let resolver = ServiceCodeResolver::default();
        let codes = resolver.codes_for(None);

        assert_eq!(codes.len(), ServiceCodeCatalog::default().service_codes.len());
        assert_eq!(codes[0].code, "T1019");
    }

    #[test]
    fn test_employee_without_codes_gets_default_catalog() {
        let resolver = ServiceCodeResolver::default();
        let employee = employee_with_codes(&[]);

        assert_eq!(resolver.codes_for(Some(&employee)).len(), 7);
    }

    #[test]
    fn test_employee_codes_keep_order_and_labels() {
        let resolver = ServiceCodeResolver::default();
        let employee = employee_with_codes(&["S5130", "T1019", "X9999"]);

        let codes = resolver.codes_for(Some(&employee));
        let order: Vec<&str> = codes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(order, vec!["S5130", "T1019", "X9999"]);
        assert_eq!(codes[0].label, "Homemaker service, per 15 minutes");
        assert_eq!(codes[2].label, "X9999");
    }

    #[test]
    fn test_most_recently_used_code_moves_first() {
        let resolver = ServiceCodeResolver::default();
        let mut employee = employee_with_codes(&["S5130", "T1019"]);
        employee.record_service_code_use("T1019");

        assert_eq!(resolver.codes_for(Some(&employee))[0].code, "T1019");
    }

    #[test]
    fn test_custom_code_is_accepted_verbatim() {
        let resolver = ServiceCodeResolver::default();
        assert_eq!(resolver.accept_custom("  ZZ-42 custom "), "ZZ-42 custom");
        assert_eq!(resolver.label_for("ZZ-42 custom"), None);
    }
}
