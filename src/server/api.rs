// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Protected sample resources

use rocket::form::{Form, FromForm};
use rocket::serde::json::Json;
use rocket::{get, post};
use serde_json::{json, Value};

use crate::auth::guards::{AdminScope, RequireScope, UserScope};

/// Any `USER`: echoes who the caller is
#[get("/dataTest")]
pub fn data_test(user: RequireScope<UserScope>) -> Json<Value> {
    Json(json!({
        "message": "Data Test",
        "username": user.subject(),
        "authorities": user.scopes,
    }))
}

#[derive(FromForm)]
pub struct SaveDataForm {
    pub data: Option<String>,
}

/// `ADMIN` only: echoes the submitted data
#[post("/saveData", data = "<form>")]
pub fn save_data(_admin: RequireScope<AdminScope>, form: Form<SaveDataForm>) -> Json<Value> {
    Json(json!({ "dataSaved": form.into_inner().data }))
}
