//! Resource schemas for both tenants.
//!
//! Default-tenant and Nirvin records have the same overall shapes but differ
//! in field names (Nirvin prefixes every field), required flags and a few
//! field types, so each is declared explicitly.

use crate::schema::{FieldDef, FileReference, ResourceSchema};
use crate::types::Tenant;

/// Every schema served by the API, default tenant first
pub fn all() -> Vec<ResourceSchema> {
    Tenant::ALL.into_iter().flat_map(for_tenant).collect()
}

pub fn for_tenant(tenant: Tenant) -> Vec<ResourceSchema> {
    match tenant {
        Tenant::Default => default_tenant(),
        Tenant::Nirvin => nirvin_tenant(),
    }
}

fn default_tenant() -> Vec<ResourceSchema> {
    vec![
        receipts(),
        employees(),
        beneficiaries(),
        payslips(),
        offer_letters(),
        termination_letters(),
        experience_letters(),
    ]
}

fn nirvin_tenant() -> Vec<ResourceSchema> {
    vec![
        nirvin_employees(),
        nirvin_payslips(),
        nirvin_offer_letters(),
        nirvin_termination_letters(),
        nirvin_experience_letters(),
    ]
}

// ========================================
// Default tenant
// ========================================

/// Donation receipts
pub fn receipts() -> ResourceSchema {
    ResourceSchema::new(Tenant::Default, "Receipt", "receipts", "/api/receipts")
        .field(FieldDef::string("name"))
        .field(FieldDef::string("email"))
        .field(FieldDef::number("amount"))
        .field(FieldDef::date("date"))
        .field(FieldDef::string("pan"))
        .field(FieldDef::number("orderid"))
}

pub fn employees() -> ResourceSchema {
    ResourceSchema::new(Tenant::Default, "Employee", "employees", "/api/employees")
        .field(FieldDef::string("name"))
        .field(FieldDef::string("phone"))
        .field(FieldDef::string("email"))
        .field(FieldDef::string("address"))
        .field(FieldDef::string("position"))
        .field(FieldDef::string("dateOfJoining"))
        .field(FieldDef::string("pan"))
        .field(FieldDef::string("aadhar"))
        .field(FieldDef::number("salary"))
        .field(FieldDef::string("pfNumber"))
        .field(FieldDef::string("esiNumber"))
        .field(FieldDef::number("accountNumber"))
        .field(FieldDef::string("bankName"))
        .field(FieldDef::string("image"))
        .upload("image", FileReference::FileName)
}

pub fn beneficiaries() -> ResourceSchema {
    ResourceSchema::new(Tenant::Default, "Beneficiary", "beneficiaries", "/api/beneficiaries")
        .field(FieldDef::string("name").required())
        .field(FieldDef::string("phone").required())
        .field(FieldDef::string("aadhar").required())
        .field(FieldDef::string("address").required())
        .field(FieldDef::string("problemDescription").required())
        .field(FieldDef::number("amountDonated").required())
        .field(FieldDef::string("image").required())
        .field(FieldDef::date("dateOfDonation").default_now())
        .upload("image", FileReference::FileName)
}

pub fn payslips() -> ResourceSchema {
    ResourceSchema::new(Tenant::Default, "Payslip", "payslips", "/api/payslips")
        .field(FieldDef::reference("employeeId"))
        .field(FieldDef::string("empid"))
        .field(FieldDef::string("name"))
        .field(FieldDef::date("dateOfJoining"))
        .field(FieldDef::string("position"))
        .field(FieldDef::string("phone"))
        .field(FieldDef::string("email"))
        .field(FieldDef::number("accountNumber"))
        .field(FieldDef::string("bankName"))
        .field(FieldDef::string("pan"))
        .field(FieldDef::string("aadhar"))
        .field(FieldDef::number("salary"))
        .field(FieldDef::number("basicSalary"))
        .field(FieldDef::number("hra"))
        .field(FieldDef::number("transportAllowance"))
        .field(FieldDef::number("pf"))
        .field(FieldDef::string("esiNumber"))
        .field(FieldDef::number("tax"))
        .field(FieldDef::number("netSalary"))
        .field(FieldDef::number("grossSalary"))
        .field(FieldDef::number("workingDays"))
        .field(FieldDef::number("presentDays"))
        .field(FieldDef::number("pfAmount"))
        .field(FieldDef::number("incentives"))
        .field(FieldDef::number("overtimePay"))
        .field(FieldDef::number("otherAllowances"))
        .field(FieldDef::date("dateOfIssuing").required())
        .populate("employeeId", "employees", &["name", "position"])
}

pub fn offer_letters() -> ResourceSchema {
    ResourceSchema::new(Tenant::Default, "Offer letter", "offer_letters", "/api/offerletters")
        .field(FieldDef::string("employeeId").required())
        .field(FieldDef::string("name").required())
        .field(FieldDef::string("phone").required())
        .field(FieldDef::string("position").required())
        .field(FieldDef::number("salary").required())
        .field(FieldDef::date("startDate").required())
        .field(FieldDef::string("details").required())
        .field(FieldDef::date("dateOfIssuing").default_now())
}

pub fn termination_letters() -> ResourceSchema {
    ResourceSchema::new(
        Tenant::Default,
        "Termination letter",
        "termination_letters",
        "/api/terminationletters",
    )
    .field(FieldDef::string("employeeId").required())
    .field(FieldDef::string("name").required())
    .field(FieldDef::number("phone").required())
    .field(FieldDef::string("reason").required())
    .field(FieldDef::string("comments").required())
    .field(FieldDef::string("position").required())
    .field(FieldDef::date("dateOfIssuing").required())
    .field(FieldDef::date("terminationDate").required())
}

pub fn experience_letters() -> ResourceSchema {
    ResourceSchema::new(
        Tenant::Default,
        "Experience letter",
        "experience_letters",
        "/api/experienceletters",
    )
    .field(FieldDef::string("employeeId").required())
    .field(FieldDef::string("name").required())
    .field(FieldDef::string("position").required())
    .field(FieldDef::string("phone").required())
    .field(FieldDef::date("dateOfJoining").required())
    .field(FieldDef::date("leavingDate").required())
    .field(FieldDef::date("dateOfIssuing").default_now())
    .with_timestamps()
}

// ========================================
// Nirvin tenant
// ========================================

pub fn nirvin_employees() -> ResourceSchema {
    ResourceSchema::new(
        Tenant::Nirvin,
        "Nirvin employee",
        "nirvin_employees",
        "/api/nirvin-employees",
    )
    .field(FieldDef::string("nirvinName").required())
    .field(FieldDef::string("nirvinPhone").required())
    .field(FieldDef::string("nirvinEmail").required())
    .field(FieldDef::string("nirvinAddress").required())
    .field(FieldDef::string("nirvinPosition").required())
    .field(FieldDef::date("nirvinDateOfJoining").required())
    .field(FieldDef::string("nirvinPan").required())
    .field(FieldDef::string("nirvinAadhar").required())
    .field(FieldDef::number("nirvinSalary").required())
    .field(FieldDef::string("nirvinImage"))
    .field(FieldDef::string("nirvinPfNumber").required())
    .field(FieldDef::string("nirvinEsiNumber").required())
    .field(FieldDef::string("nirvinAccountNumber").required())
    .field(FieldDef::string("nirvinBankName").required())
    .upload("nirvinImage", FileReference::StoredPath)
}

pub fn nirvin_payslips() -> ResourceSchema {
    ResourceSchema::new(
        Tenant::Nirvin,
        "Nirvin payslip",
        "nirvin_payslips",
        "/api/nirvin-payslips",
    )
    .field(FieldDef::reference("nirvinEmployeeId"))
    .field(FieldDef::string("nirvinEmpid"))
    .field(FieldDef::string("nirvinName"))
    .field(FieldDef::date("nirvinDateOfJoining"))
    .field(FieldDef::string("nirvinPosition"))
    .field(FieldDef::string("nirvinPhone"))
    .field(FieldDef::string("nirvinEmail"))
    .field(FieldDef::number("nirvinAccountNumber"))
    .field(FieldDef::string("nirvinBankName"))
    .field(FieldDef::string("nirvinPan"))
    .field(FieldDef::string("nirvinAadhar"))
    .field(FieldDef::number("nirvinSalary"))
    .field(FieldDef::number("nirvinBasicSalary"))
    .field(FieldDef::number("nirvinHra"))
    .field(FieldDef::number("nirvinTransportAllowance"))
    .field(FieldDef::number("nirvinPf"))
    .field(FieldDef::string("nirvinEsiNumber"))
    .field(FieldDef::number("nirvinTax"))
    .field(FieldDef::number("nirvinNetSalary"))
    .field(FieldDef::number("nirvinGrossSalary"))
    .field(FieldDef::number("nirvinWorkingDays"))
    .field(FieldDef::number("nirvinPresentDays"))
    .field(FieldDef::number("nirvinPfAmount"))
    .field(FieldDef::number("nirvinIncentives"))
    .field(FieldDef::number("nirvinOvertimePay"))
    .field(FieldDef::number("nirvinOtherAllowances"))
    .field(FieldDef::date("nirvinDateOfIssuing").required())
    .populate("nirvinEmployeeId", "nirvin_employees", &["nirvinName", "nirvinPosition"])
}

pub fn nirvin_offer_letters() -> ResourceSchema {
    ResourceSchema::new(
        Tenant::Nirvin,
        "Nirvin offer letter",
        "nirvin_offer_letters",
        "/api/nirvin-offer-letters",
    )
    .field(FieldDef::string("nirvinEmployeeId").required())
    .field(FieldDef::string("nirvinEmpid").required())
    .field(FieldDef::string("nirvinName").required())
    .field(FieldDef::string("nirvinPhone").required())
    .field(FieldDef::string("nirvinEmail").required())
    .field(FieldDef::string("nirvinPosition").required())
    .field(FieldDef::number("nirvinSalary").required())
    .field(FieldDef::date("nirvinStartDate").required())
    .field(FieldDef::string("nirvinDetails").required())
    .field(FieldDef::date("nirvinDateOfIssuing").default_now())
}

pub fn nirvin_termination_letters() -> ResourceSchema {
    ResourceSchema::new(
        Tenant::Nirvin,
        "Nirvin termination letter",
        "nirvin_termination_letters",
        "/api/nirvin-terminationletters",
    )
    .field(FieldDef::string("nirvinEmployeeId").required())
    .field(FieldDef::string("nirvinName").required())
    .field(FieldDef::number("nirvinPhone").required())
    .field(FieldDef::string("nirvinReason").required())
    .field(FieldDef::string("nirvinComments"))
    .field(FieldDef::string("nirvinPosition").required())
    .field(FieldDef::date("nirvinDateOfIssuing").required())
    .field(FieldDef::date("nirvinTerminationDate").required())
    .with_timestamps()
}

pub fn nirvin_experience_letters() -> ResourceSchema {
    ResourceSchema::new(
        Tenant::Nirvin,
        "Nirvin experience letter",
        "nirvin_experience_letters",
        "/api/nirvin-experience-letters",
    )
    .field(FieldDef::string("nirvinEmployeeId"))
    .field(FieldDef::string("nirvinName"))
    .field(FieldDef::string("nirvinPosition"))
    .field(FieldDef::string("nirvinPhone"))
    .field(FieldDef::date("nirvinDateOfJoining"))
    .field(FieldDef::date("nirvinLeavingDate"))
    .field(FieldDef::date("nirvinDateOfIssuing"))
    .field(FieldDef::string("nirvinComments"))
}
