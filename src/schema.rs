use crate::util::lang::Language;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Number,
    Date,
    Boolean,
}

/// What a column says about an employee's loan, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanRole {
    Flag,
    Amount,
    Balance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    /// English display label
    pub label: String,
    #[serde(default)]
    pub label_ar: Option<String>,
    /// Bookkeeping fields never shown to users
    #[serde(default)]
    pub internal: bool,
    /// Salary and allowance fields summed into total compensation
    #[serde(default)]
    pub compensation: bool,
    #[serde(default)]
    pub loan: Option<LoanRole>,
}

/// The employee table as seen by the prompt builder, the classification
/// validator and the formatter. Bump `version` whenever columns change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeSchema {
    pub version: String,
    pub table: String,
    pub name_column: String,
    pub columns: Vec<ColumnSpec>,
}

impl EmployeeSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn is_internal(&self, name: &str) -> bool {
        self.column(name).is_some_and(|c| c.internal)
    }

    /// Columns a user may ask about, in declaration order.
    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| !c.internal)
    }

    /// Display label for a column. Arabic falls back to the English label
    /// when no translation is configured; unknown columns are humanized.
    pub fn label(&self, name: &str, lang: Language) -> String {
        match (self.column(name), lang) {
            (Some(col), Language::Arabic) => {
                col.label_ar.clone().unwrap_or_else(|| col.label.clone())
            }
            (Some(col), Language::English) => col.label.clone(),
            (None, _) => humanize(name),
        }
    }

    pub fn loan_role(&self, name: &str) -> Option<LoanRole> {
        self.column(name).and_then(|c| c.loan)
    }

    pub fn columns_with_loan_role(&self, role: LoanRole) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(move |c| c.loan == Some(role))
    }
}

/// `base_salary` -> `Base Salary`
pub fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn column(
    name: &str,
    kind: ColumnKind,
    label: &str,
    label_ar: Option<&str>,
) -> ColumnSpec {
    ColumnSpec {
        name: name.to_string(),
        kind,
        label: label.to_string(),
        label_ar: label_ar.map(str::to_string),
        internal: false,
        compensation: false,
        loan: None,
    }
}

impl Default for EmployeeSchema {
    fn default() -> Self {
        use ColumnKind::*;

        let internal = |mut c: ColumnSpec| {
            c.internal = true;
            c
        };
        let pay = |mut c: ColumnSpec| {
            c.compensation = true;
            c
        };
        let loan = |mut c: ColumnSpec, role: LoanRole| {
            c.loan = Some(role);
            c
        };

        Self {
            version: "2024.1".to_string(),
            table: "qag_employees".to_string(),
            name_column: "full_name".to_string(),
            columns: vec![
                internal(column("id", Number, "ID", None)),
                column("full_name", Text, "Full Name", Some("الاسم الكامل")),
                column("rank", Text, "Rank", Some("الرتبة")),
                column("position", Text, "Position", Some("المنصب")),
                column("marital_status", Text, "Marital Status", Some("الحالة الاجتماعية")),
                pay(column("base_salary", Number, "Base Salary", Some("الراتب الأساسي"))),
                pay(column("housing_allowance", Number, "Housing Allowance", Some("بدل السكن"))),
                pay(column("transportation_allowance", Number, "Transportation Allowance", Some("بدل المواصلات"))),
                pay(column("other_allowances", Number, "Other Allowances", None)),
                loan(column("has_loan", Boolean, "Has Loan", Some("لديه قرض")), LoanRole::Flag),
                loan(column("loan_amount", Number, "Loan Amount", Some("مبلغ القرض")), LoanRole::Amount),
                loan(
                    column("remaining_loan_balance", Number, "Remaining Loan Balance", Some("رصيد القرض المتبقي")),
                    LoanRole::Balance,
                ),
                column("last_leave_date", Date, "Last Leave Date", Some("تاريخ آخر إجازة")),
                column("last_leave_duration_days", Number, "Last Leave Duration (days)", Some("مدة آخر إجازة (أيام)")),
                internal(column("created_at", Date, "Created At", None)),
            ],
        }
    }
}
