//! Repository API (Bitbucket)

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use ds_services::bitbucket::{
    CheckBranchExistsCommand, CheckBranchExistsRequest, GetDefaultBranchCommand,
    GetDefaultBranchRequest, ListRepositoriesCommand, ListRepositoriesRequest,
};

use crate::envelope::Envelope;
use crate::error::{ApiError, ApiPath};
use crate::project_api::{ExistsResponse, InstanceQuery};
use crate::ApiContext;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BranchResponse {
    pub id: String,
    pub display_id: String,
    pub is_default: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RepositoryResponse {
    pub slug: String,
    pub name: String,
}

#[derive(Clone)]
pub struct RepositoryState {
    pub list: Arc<ListRepositoriesCommand>,
    pub default_branch: Arc<GetDefaultBranchCommand>,
    pub branch_exists: Arc<CheckBranchExistsCommand>,
}

/// Repositories of a project
#[utoipa::path(
    get,
    path = "/api/v1/project/{projectKey}/repositories",
    tag = "repository",
    params(
        ("projectKey" = String, Path, description = "Project key"),
        InstanceQuery
    ),
    responses(
        (status = 200, description = "Repository list", body = Envelope<Vec<RepositoryResponse>>),
        (status = 404, description = "Project not found")
    )
)]
pub async fn list_repositories(
    State(state): State<RepositoryState>,
    ApiPath(project_key): ApiPath<String>,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<Envelope<Vec<RepositoryResponse>>>, ApiError> {
    let repos = state
        .list
        .execute(&ListRepositoriesRequest {
            instance: query.instance,
            project: project_key,
        })
        .await?;
    Ok(Json(Envelope::ok(
        repos
            .into_iter()
            .map(|r| RepositoryResponse {
                slug: r.slug,
                name: r.name,
            })
            .collect(),
    )))
}

/// Default branch of a repository
#[utoipa::path(
    get,
    path = "/api/v1/project/{projectKey}/repositories/{repositorySlug}/branches/default",
    tag = "repository",
    params(
        ("projectKey" = String, Path, description = "Project key"),
        ("repositorySlug" = String, Path, description = "Repository slug"),
        InstanceQuery
    ),
    responses(
        (status = 200, description = "Default branch", body = Envelope<BranchResponse>),
        (status = 404, description = "Project or repository not found")
    )
)]
pub async fn get_default_branch(
    State(state): State<RepositoryState>,
    ApiPath((project_key, repo_slug)): ApiPath<(String, String)>,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<Envelope<BranchResponse>>, ApiError> {
    let branch = state
        .default_branch
        .execute(&GetDefaultBranchRequest {
            instance: query.instance,
            project: project_key,
            repo: repo_slug,
        })
        .await?;
    Ok(Json(Envelope::ok(BranchResponse {
        id: branch.id,
        display_id: branch.display_id,
        is_default: branch.is_default,
    })))
}

/// Whether a branch exists
#[utoipa::path(
    get,
    path = "/api/v1/project/{projectKey}/repositories/{repositorySlug}/branches/{branch}/exists",
    tag = "repository",
    params(
        ("projectKey" = String, Path, description = "Project key"),
        ("repositorySlug" = String, Path, description = "Repository slug"),
        ("branch" = String, Path, description = "Branch display name"),
        InstanceQuery
    ),
    responses(
        (status = 200, description = "Existence answer", body = Envelope<ExistsResponse>)
    )
)]
pub async fn branch_exists(
    State(state): State<RepositoryState>,
    ApiPath((project_key, repo_slug, branch)): ApiPath<(String, String, String)>,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<Envelope<ExistsResponse>>, ApiError> {
    let exists = state
        .branch_exists
        .execute(&CheckBranchExistsRequest {
            instance: query.instance,
            project: project_key,
            repo: repo_slug,
            branch,
        })
        .await?;
    Ok(Json(Envelope::ok(ExistsResponse { exists })))
}

pub fn repository_router(context: &ApiContext) -> OpenApiRouter {
    let state = RepositoryState {
        list: Arc::new(ListRepositoriesCommand::new(Arc::clone(&context.bitbucket))),
        default_branch: Arc::new(GetDefaultBranchCommand::new(Arc::clone(&context.bitbucket))),
        branch_exists: Arc::new(CheckBranchExistsCommand::new(Arc::clone(&context.bitbucket))),
    };
    OpenApiRouter::new()
        .routes(routes!(list_repositories))
        .routes(routes!(get_default_branch))
        .routes(routes!(branch_exists))
        .with_state(state)
}
