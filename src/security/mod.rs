// ABOUTME: Security helpers shared by routes and middleware
// ABOUTME: Cookie parsing and flow-cookie construction
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod cookies;
