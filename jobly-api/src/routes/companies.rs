/// Company endpoints
///
/// - `POST /companies` (admin)
/// - `GET /companies?nameLike=&minEmployees=&maxEmployees=`
/// - `GET /companies/:handle`
/// - `PATCH /companies/:handle` (admin)
/// - `DELETE /companies/:handle` (admin)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{QueryPairs, ValidatedJson, ValidatedPatch},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use jobly_shared::models::company::{Company, CompanyDetail, CompanyFilters, NewCompany};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// New company request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompanyRequest {
    #[validate(length(min = 1, max = 25, message = "Handle must be 1-25 characters"))]
    pub handle: String,

    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    pub description: String,

    #[validate(range(min = 0, message = "Employee count must be >= 0"))]
    pub num_employees: Option<i32>,

    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
}

/// Company update request
///
/// Unknown keys are accepted here and rejected by the repository, which
/// names the offending field.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 0, message = "Employee count must be >= 0"))]
    pub num_employees: Option<i32>,

    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompanyResponse<T> {
    pub company: T,
}

#[derive(Debug, Serialize)]
pub struct CompaniesResponse {
    pub companies: Vec<Company>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: String,
}

pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<NewCompanyRequest>,
) -> ApiResult<(StatusCode, Json<CompanyResponse<Company>>)> {
    let company = Company::create(
        &state.db,
        NewCompany {
            handle: req.handle,
            name: req.name,
            description: req.description,
            num_employees: req.num_employees,
            logo_url: req.logo_url,
        },
    )
    .await?;

    info!(handle = %company.handle, "Created company");
    Ok((StatusCode::CREATED, Json(CompanyResponse { company })))
}

pub async fn list(
    State(state): State<AppState>,
    query: QueryPairs,
) -> ApiResult<Json<CompaniesResponse>> {
    let filters = CompanyFilters::from_params(query.iter())?;
    let companies = Company::find_all(&state.db, &filters).await?;

    Ok(Json(CompaniesResponse { companies }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> ApiResult<Json<CompanyResponse<CompanyDetail>>> {
    let company = Company::get(&state.db, &handle).await?;
    Ok(Json(CompanyResponse { company }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    ValidatedPatch { patch, .. }: ValidatedPatch<UpdateCompanyRequest>,
) -> ApiResult<Json<CompanyResponse<Company>>> {
    let company = Company::update(&state.db, &handle, &patch).await?;

    info!(handle = %handle, "Updated company");
    Ok(Json(CompanyResponse { company }))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    Company::remove(&state.db, &handle).await?;

    info!(handle = %handle, "Deleted company");
    Ok(Json(DeletedResponse { deleted: handle }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_company_request_rules() {
        let ok: NewCompanyRequest = serde_json::from_value(json!({
            "handle": "new",
            "name": "New",
            "description": "DescNew",
            "numEmployees": 10,
            "logoUrl": "http://new.img"
        }))
        .unwrap();
        assert!(ok.validate().is_ok());

        let bad: NewCompanyRequest = serde_json::from_value(json!({
            "handle": "new",
            "name": "New",
            "description": "DescNew",
            "numEmployees": -1,
            "logoUrl": "not-a-url"
        }))
        .unwrap();
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
    }

    #[test]
    fn test_new_company_request_rejects_unknown_fields() {
        let result = serde_json::from_value::<NewCompanyRequest>(json!({
            "handle": "new",
            "name": "New",
            "description": "DescNew",
            "ceo": "someone"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_request_tolerates_unknown_fields() {
        let req: UpdateCompanyRequest =
            serde_json::from_value(json!({ "handle": "c1-new", "name": "C1" })).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_deleted_response_shape() {
        let json = serde_json::to_value(DeletedResponse {
            deleted: "c1".to_string(),
        })
        .unwrap();
        assert_eq!(json, json!({ "deleted": "c1" }));
    }
}
