//! Request payload validation.
//!
//! Mirrors the field rules the frontend forms were written against. Failures
//! collect into the `{ field, message }` array carried by
//! [`AppError::Validation`] rather than stopping at the first bad field.
use std::sync::OnceLock;

use regex::Regex;

use crate::{
    error::{AppError, FieldError},
    property::PropertyPayload,
    user::{LoginRequest, RegisterRequest},
};

pub const GENDERS: [&str; 4] = ["male", "female", "other", "prefer-not-to-say"];

pub fn validate_register(payload: &RegisterRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    let name_re = name_regex();

    let first_name = payload.first_name.as_deref().unwrap_or("").trim();
    if !(2..=50).contains(&first_name.len()) {
        errors.push(FieldError::new(
            "firstName",
            "First name must be between 2 and 50 characters",
        ));
    } else if !name_re.is_match(first_name) {
        errors.push(FieldError::new(
            "firstName",
            "First name can only contain letters and spaces",
        ));
    }

    let last_name = payload.last_name.as_deref().unwrap_or("").trim();
    if !(2..=50).contains(&last_name.len()) {
        errors.push(FieldError::new(
            "lastName",
            "Last name must be between 2 and 50 characters",
        ));
    } else if !name_re.is_match(last_name) {
        errors.push(FieldError::new(
            "lastName",
            "Last name can only contain letters and spaces",
        ));
    }

    let username = payload.username.as_deref().unwrap_or("").trim();
    if !(3..=30).contains(&username.len()) {
        errors.push(FieldError::new(
            "username",
            "Username must be between 3 and 30 characters",
        ));
    } else if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push(FieldError::new(
            "username",
            "Username can only contain letters and numbers",
        ));
    }

    let email = payload.email.as_deref().unwrap_or("").trim();
    if !is_email(email) {
        errors.push(FieldError::new(
            "email",
            "Please provide a valid email address",
        ));
    }

    let password = payload.password.as_deref().unwrap_or("");
    if password.len() < 6 {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters long",
        ));
    } else if !has_password_classes(password) {
        errors.push(FieldError::new(
            "password",
            "Password must contain at least one lowercase letter, one uppercase letter, and one number",
        ));
    }

    let gender = payload.gender.as_deref().unwrap_or("");
    if !GENDERS.contains(&gender) {
        errors.push(FieldError::new(
            "gender",
            "Please select a valid gender option",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub fn validate_login(payload: &LoginRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    let email = payload.email.as_deref().unwrap_or("").trim();
    if !is_email(email) {
        errors.push(FieldError::new(
            "email",
            "Please provide a valid email address",
        ));
    }

    if payload.password.as_deref().unwrap_or("").is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub fn validate_property(payload: &PropertyPayload) -> Result<(), AppError> {
    let mut errors = Vec::new();

    let title = payload.title.as_deref().unwrap_or("").trim();
    if !(3..=200).contains(&title.len()) {
        errors.push(FieldError::new(
            "title",
            "Property title must be between 3 and 200 characters",
        ));
    }

    if payload.location.as_deref().unwrap_or("").trim().is_empty() {
        errors.push(FieldError::new("location", "Location is required"));
    }

    match payload.price {
        Some(price) if price >= 0.0 => {}
        _ => errors.push(FieldError::new("price", "Price must be a positive number")),
    }

    if payload.property_type().is_none() {
        errors.push(FieldError::new("type", "Invalid property type"));
    }

    match payload.bedrooms {
        Some(bedrooms) if (1..=10).contains(&bedrooms) => {}
        _ => errors.push(FieldError::new(
            "bedrooms",
            "Bedrooms must be between 1 and 10",
        )),
    }

    match payload.bathrooms {
        Some(bathrooms) if (1..=10).contains(&bathrooms) => {}
        _ => errors.push(FieldError::new(
            "bathrooms",
            "Bathrooms must be between 1 and 10",
        )),
    }

    match payload.max_occupancy {
        Some(max_occupancy) if (1..=20).contains(&max_occupancy) => {}
        _ => errors.push(FieldError::new(
            "maxOccupancy",
            "Max occupancy must be between 1 and 20",
        )),
    }

    if payload.description.as_deref().unwrap_or("").trim().len() < 10 {
        errors.push(FieldError::new(
            "description",
            "Description must be at least 10 characters long",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn name_regex() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();

    NAME_RE.get_or_init(|| Regex::new(r"^[a-zA-Z\s]+$").unwrap())
}

fn is_email(input: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

    EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
        .is_match(input)
}

fn has_password_classes(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::{validate_login, validate_property, validate_register};
    use crate::{
        error::AppError,
        property::PropertyPayload,
        user::{LoginRequest, RegisterRequest},
    };

    fn register_payload() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            username: Some("janedoe".to_string()),
            email: Some("jane@example.com".to_string()),
            password: Some("Passw0rd".to_string()),
            gender: Some("female".to_string()),
        }
    }

    fn property_payload() -> PropertyPayload {
        PropertyPayload {
            title: Some("Sunny studio downtown".to_string()),
            location: Some("Springfield".to_string()),
            price: Some(850.0),
            kind: Some("studio".to_string()),
            bedrooms: Some(1),
            bathrooms: Some(1),
            max_occupancy: Some(2),
            description: Some("Bright studio close to campus".to_string()),
            image: None,
            house_rules: None,
        }
    }

    fn field_names(result: Result<(), AppError>) -> Vec<&'static str> {
        match result {
            Err(AppError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_register_accepts_valid_payload() {
        assert!(validate_register(&register_payload()).is_ok());
    }

    #[test]
    fn test_register_rejects_weak_password() {
        let mut payload = register_payload();
        payload.password = Some("password".to_string());

        assert_eq!(field_names(validate_register(&payload)), vec!["password"]);
    }

    #[test]
    fn test_register_collects_all_failures() {
        let payload = RegisterRequest {
            first_name: None,
            last_name: Some("D0e".to_string()),
            username: Some("a".to_string()),
            email: Some("not-an-email".to_string()),
            password: Some("short".to_string()),
            gender: Some("unknown".to_string()),
        };

        let fields = field_names(validate_register(&payload));
        assert_eq!(
            fields,
            vec!["firstName", "lastName", "username", "email", "password", "gender"]
        );
    }

    #[test]
    fn test_login_requires_both_fields() {
        let payload = LoginRequest {
            email: Some("bad".to_string()),
            password: None,
        };

        assert_eq!(
            field_names(validate_login(&payload)),
            vec!["email", "password"]
        );
    }

    #[test]
    fn test_property_accepts_valid_payload() {
        assert!(validate_property(&property_payload()).is_ok());
    }

    #[test]
    fn test_property_range_checks() {
        let mut payload = property_payload();
        payload.bedrooms = Some(11);
        payload.max_occupancy = Some(0);
        payload.price = Some(-5.0);

        assert_eq!(
            field_names(validate_property(&payload)),
            vec!["price", "bedrooms", "maxOccupancy"]
        );
    }
}
