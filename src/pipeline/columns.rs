//! Column names of the application table and of the derived features

pub const ID: &str = "SK_ID_CURR";
pub const TARGET: &str = "TARGET";

pub const DAYS_BIRTH: &str = "DAYS_BIRTH";
pub const DAYS_EMPLOYED: &str = "DAYS_EMPLOYED";

pub const INCOME_TOTAL: &str = "AMT_INCOME_TOTAL";
pub const CREDIT: &str = "AMT_CREDIT";
pub const ANNUITY: &str = "AMT_ANNUITY";
pub const GOODS_PRICE: &str = "AMT_GOODS_PRICE";

pub const GENDER: &str = "CODE_GENDER";
pub const EDUCATION: &str = "NAME_EDUCATION_TYPE";
pub const FAMILY_STATUS: &str = "NAME_FAMILY_STATUS";
pub const HOUSING: &str = "NAME_HOUSING_TYPE";
pub const OCCUPATION: &str = "OCCUPATION_TYPE";
pub const CONTRACT_TYPE: &str = "NAME_CONTRACT_TYPE";

pub const CHILDREN: &str = "CNT_CHILDREN";
pub const FAMILY_MEMBERS: &str = "CNT_FAM_MEMBERS";

// Derived by the preprocessor
pub const AGE_YEARS: &str = "AGE_YEARS";
pub const EMPLOYMENT_YEARS: &str = "EMPLOYMENT_YEARS";
pub const DEBT_TO_INCOME: &str = "DTI";
pub const LOAN_TO_INCOME: &str = "LOAN_TO_INCOME";
pub const ANNUITY_TO_CREDIT: &str = "ANNUITY_TO_CREDIT";
pub const INCOME_BRACKET: &str = "INCOME_BRACKET";

/// Level that rare and relabelled categories are folded into
pub const OTHER_LEVEL: &str = "Other";

/// Raw columns that feature derivation and relabelling depend on.
pub const REQUIRED_RAW_COLUMNS: [&str; 9] = [
    DAYS_BIRTH,
    DAYS_EMPLOYED,
    INCOME_TOTAL,
    CREDIT,
    ANNUITY,
    GENDER,
    EDUCATION,
    FAMILY_STATUS,
    HOUSING,
];

/// Numeric columns that winsorization leaves untouched.
pub const WINSOR_EXEMPT: [&str; 2] = [ID, TARGET];
