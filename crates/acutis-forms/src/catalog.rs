//! Built-in element catalog.
//!
//! Seeded into a fresh library snapshot when no persisted library exists.

use std::sync::LazyLock;

use acutis_core::models::element::{ElementCategory, FormElement, LibrarySnapshot};
use acutis_core::models::field::{FieldDefinition, FieldType, FieldValidation};

pub const CATALOG_VERSION: &str = "1.0";

/// Elements most templates start from, in suggestion order.
pub const POPULAR_ELEMENT_IDS: [&str; 10] = [
    "element-name-basic",
    "element-contact-basic",
    "element-dob",
    "element-address-irish",
    "element-emergency-contact",
    "element-medications",
    "element-allergies",
    "element-treatment-consent",
    "element-privacy-consent",
    "element-session-details",
];

const YES_NO: [(&str, &str); 2] = [("yes", "Yes"), ("no", "No")];

fn element(id: &str, name: &str, description: &str, fields: Vec<FieldDefinition>) -> FormElement {
    FormElement {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        fields,
    }
}

fn category(id: &str, name: &str, description: &str, elements: Vec<FormElement>) -> ElementCategory {
    ElementCategory {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        elements,
    }
}

fn personal_information() -> ElementCategory {
    let name = element(
        "element-name-basic",
        "Basic Name Fields",
        "First name, surname and preferred name",
        vec![
            FieldDefinition::new("firstName", FieldType::Text, "First Name", true)
                .with_validation(FieldValidation {
                    min_length: Some(2),
                    max_length: Some(50),
                    ..Default::default()
                }),
            FieldDefinition::new("surname", FieldType::Text, "Surname", true).with_validation(
                FieldValidation {
                    min_length: Some(2),
                    max_length: Some(50),
                    ..Default::default()
                },
            ),
            FieldDefinition::new("preferredName", FieldType::Text, "Preferred Name", false),
        ],
    );

    let dob = element(
        "element-dob",
        "Date of Birth",
        "Date of birth with adult age check",
        vec![
            FieldDefinition::new("dateOfBirth", FieldType::Date, "Date of Birth", true)
                .with_validation(FieldValidation {
                    min_age: Some(18),
                    ..Default::default()
                })
                .with_help_text("Residents must be 18 or over"),
        ],
    );

    let contact = element(
        "element-contact-basic",
        "Basic Contact Details",
        "Phone number and email address",
        vec![
            FieldDefinition::new("phone", FieldType::Tel, "Phone Number", true)
                .with_placeholder("087 123 4567")
                .with_validation(FieldValidation {
                    pattern: Some(r"^\+?[0-9 ]{7,15}$".to_string()),
                    ..Default::default()
                }),
            FieldDefinition::new("email", FieldType::Email, "Email Address", false)
                .with_validation(FieldValidation {
                    pattern: Some(r"^[^@\s]+@[^@\s]+\.[^@\s]+$".to_string()),
                    ..Default::default()
                }),
        ],
    );

    let address = element(
        "element-address-irish",
        "Irish Address",
        "Postal address with county and Eircode",
        vec![
            FieldDefinition::new("address.line1", FieldType::Text, "Address Line 1", true),
            FieldDefinition::new("address.line2", FieldType::Text, "Address Line 2", false),
            FieldDefinition::new("address.town", FieldType::Text, "Town / City", true),
            FieldDefinition::new("address.county", FieldType::Text, "County", true),
            FieldDefinition::new("address.eircode", FieldType::Text, "Eircode", false)
                .with_placeholder("D02 X285")
                .with_validation(FieldValidation {
                    pattern: Some(r"^[A-Za-z0-9]{3} ?[A-Za-z0-9]{4}$".to_string()),
                    ..Default::default()
                }),
        ],
    );

    category(
        "personal-information",
        "Personal Information",
        "Identity and contact details",
        vec![name, dob, contact, address],
    )
}

fn emergency() -> ElementCategory {
    let contact = element(
        "element-emergency-contact",
        "Emergency Contact",
        "Next of kin or nominated emergency contact",
        vec![
            FieldDefinition::new("emergencyContact.name", FieldType::Text, "Contact Name", true),
            FieldDefinition::new(
                "emergencyContact.relationship",
                FieldType::Select,
                "Relationship",
                true,
            )
            .with_options(&[
                ("parent", "Parent"),
                ("partner", "Partner"),
                ("sibling", "Sibling"),
                ("friend", "Friend"),
                ("other", "Other"),
            ]),
            FieldDefinition::new("emergencyContact.phone", FieldType::Tel, "Contact Phone", true),
        ],
    );

    category(
        "emergency",
        "Emergency Contacts",
        "People to contact in an emergency",
        vec![contact],
    )
}

fn medical() -> ElementCategory {
    let medications = element(
        "element-medications",
        "Current Medications",
        "Prescribed and over-the-counter medication",
        vec![
            FieldDefinition::new("takingMedication", FieldType::Checkbox, "Currently taking medication", false),
            FieldDefinition::new("medications", FieldType::Textarea, "Medication Details", true)
                .depends_on("takingMedication")
                .with_help_text("Name, dose and frequency for each medication"),
        ],
    );

    let allergies = element(
        "element-allergies",
        "Allergies",
        "Known allergies and reactions",
        vec![
            FieldDefinition::new("hasAllergies", FieldType::Radio, "Any known allergies?", true)
                .with_options(&YES_NO),
            FieldDefinition::new("allergyDetails", FieldType::Textarea, "Allergy Details", false),
        ],
    );

    let insurance = element(
        "element-insurance",
        "Health Insurance",
        "Private health insurance cover",
        vec![
            FieldDefinition::new("hasInsurance", FieldType::Checkbox, "Has private health insurance", false),
            FieldDefinition::new("insuranceProvider", FieldType::Text, "Insurance Provider", true)
                .depends_on("hasInsurance"),
            FieldDefinition::new("policyNumber", FieldType::Text, "Policy Number", true)
                .depends_on("hasInsurance"),
        ],
    );

    category(
        "medical",
        "Medical History",
        "Medication, allergies and cover",
        vec![medications, allergies, insurance],
    )
}

fn consent() -> ElementCategory {
    let treatment = element(
        "element-treatment-consent",
        "Treatment Consent",
        "Consent to participate in the treatment programme",
        vec![
            FieldDefinition::new("treatmentConsent", FieldType::Checkbox, "I consent to treatment", true),
            FieldDefinition::new("consentDate", FieldType::Date, "Date of Consent", true),
        ],
    );

    let privacy = element(
        "element-privacy-consent",
        "Privacy Consent",
        "Consent to the processing of personal data",
        vec![FieldDefinition::new(
            "privacyConsent",
            FieldType::Checkbox,
            "I have read the privacy notice",
            true,
        )],
    );

    category(
        "consent",
        "Consent",
        "Signed consents and acknowledgements",
        vec![treatment, privacy],
    )
}

fn clinical() -> ElementCategory {
    let session = element(
        "element-session-details",
        "Session Details",
        "Therapy session type and notes",
        vec![
            FieldDefinition::new("sessionType", FieldType::Select, "Session Type", true).with_options(&[
                ("individual", "Individual"),
                ("group", "Group"),
                ("family", "Family"),
            ]),
            FieldDefinition::new("sessionDate", FieldType::Datetime, "Session Date", true),
            FieldDefinition::new("sessionNotes", FieldType::Textarea, "Notes", false)
                .with_validation(FieldValidation {
                    max_length: Some(2000),
                    ..Default::default()
                }),
        ],
    );

    category(
        "clinical",
        "Clinical",
        "Elements used by therapy and clinical staff",
        vec![session],
    )
}

/// The seeded catalog categories.
pub fn categories() -> &'static [ElementCategory] {
    static CATEGORIES: LazyLock<Vec<ElementCategory>> = LazyLock::new(|| {
        vec![
            personal_information(),
            emergency(),
            medical(),
            consent(),
            clinical(),
        ]
    });
    &CATEGORIES
}

/// A fresh library snapshot holding only the seeded catalog.
pub fn seed_snapshot() -> LibrarySnapshot {
    LibrarySnapshot {
        version: CATALOG_VERSION.to_string(),
        last_updated: None,
        categories: categories().to_vec(),
        custom_elements: Vec::new(),
    }
}
