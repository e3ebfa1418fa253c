use utoipa::OpenApi;

use super::blogs;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blogs",
        description = "HTTP endpoints of the blogs service, the gRPC `blog.BlogService` exposes the same operations",
    ),
    paths(
        super::health,
        super::version,
        blogs::list,
        blogs::create,
        blogs::get,
        blogs::patch,
        blogs::delete,
        blogs::list_by_author,
        blogs::list_by_status,
        blogs::votes,
        blogs::votes_count,
        blogs::add_vote,
        blogs::change_vote,
        blogs::add_comment,
        blogs::update_comment,
        blogs::delete_comment,
    ),
    components(schemas(crate::error::InternalError, common::Version)),
    tags(
        (name = "blogs", description = "Blog posts"),
        (name = "votes", description = "Votes of a blog"),
        (name = "comments", description = "Comments of a blog"),
    )
)]
pub struct OpenApiRoot;

impl OpenApiRoot {
    pub fn build_openapi() -> utoipa::openapi::OpenApi {
        Self::openapi()
    }
}
