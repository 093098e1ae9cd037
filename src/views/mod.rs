// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Screen-level state: view controllers and the auth forms.

pub mod controller;
pub mod forms;
pub mod login;
pub mod register;

pub use controller::{ViewController, ViewStatus};
pub use forms::{SignInForm, SignUpForm};
pub use login::LoginView;
pub use register::RegisterView;
