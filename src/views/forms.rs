// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in, sign-up and password reset forms.
//!
//! Validation reports one message at a time, for the first failing field in
//! form order, the way the forms show it.

use crate::models::Credentials;
use validator::{Validate, ValidateEmail, ValidationErrors};

/// Sign-in form.
#[derive(Debug, Clone, Default, Validate)]
pub struct SignInForm {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// Check the form, returning the message to show on failure.
    pub fn check(&self) -> Result<Credentials, String> {
        let form = Self {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };
        if form.email.is_empty() {
            return Err("Email is required".to_string());
        }
        if form.password.is_empty() {
            return Err("Password is required".to_string());
        }
        form.validate()
            .map_err(|e| first_message(&e, &["email"]))?;
        Ok(Credentials::new(form.email, form.password))
    }
}

/// Registration form.
#[derive(Debug, Clone, Default, Validate)]
pub struct SignUpForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

impl SignUpForm {
    pub fn new(name: &str, email: &str, password: &str, confirm_password: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        }
    }

    /// Check the form, returning credentials and the trimmed display name.
    pub fn check(&self) -> Result<(Credentials, String), String> {
        let form = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
        };
        if form.name.is_empty() {
            return Err("Name is required".to_string());
        }
        if form.email.is_empty() {
            return Err("Email is required".to_string());
        }
        if form.password.is_empty() {
            return Err("Password is required".to_string());
        }
        form.validate().map_err(|e| {
            first_message(&e, &["name", "email", "password", "confirm_password"])
        })?;
        Ok((Credentials::new(form.email, form.password), form.name))
    }
}

/// Check an email typed into the password reset box.
pub fn check_reset_email(email: &str) -> Result<String, String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Enter your email".to_string());
    }
    if !email.validate_email() {
        return Err("Invalid email".to_string());
    }
    Ok(email.to_string())
}

fn first_message(errors: &ValidationErrors, field_order: &[&str]) -> String {
    let fields = errors.field_errors();
    field_order
        .iter()
        .find_map(|field| {
            let error = fields.get(*field)?.first()?;
            Some(
                error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field)),
            )
        })
        .unwrap_or_else(|| "Invalid form".to_string())
}
