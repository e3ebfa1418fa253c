use axum::extract::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use blogs_models::Blog;
use blogs_models::BlogRepository;
use blogs_models::Category;
use blogs_models::Comment;
use blogs_models::Status;
use blogs_models::Vote;
use blogs_models::stored_precision;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use utoipa::IntoParams;
use utoipa::ToSchema;

use crate::error::Result;

fn now() -> DateTime<Utc> {
    stored_precision(Utc::now())
}

/// Creation form for a blog
#[derive(Serialize, Deserialize, ToSchema)]
pub(in crate::views) struct BlogCreateForm {
    pub user_id: u32,
    #[serde(default)]
    pub username: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to the time of the request
    #[serde(default = "now")]
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    #[schema(value_type = i32, minimum = 0, maximum = 4)]
    pub status: Status,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    #[schema(value_type = i32, minimum = 0, maximum = 6)]
    pub category: Category,
    #[serde(default)]
    pub comments: Vec<CommentForm>,
    #[serde(default)]
    pub votes: Vec<VoteForm>,
}

impl From<BlogCreateForm> for Blog {
    fn from(form: BlogCreateForm) -> Self {
        Blog {
            id: None,
            user_id: form.user_id,
            username: form.username,
            title: form.title,
            description: form.description,
            creation_time: stored_precision(form.creation_time),
            status: form.status,
            image: form.image,
            category: form.category,
            comments: form.comments.into_iter().map(Comment::from).collect(),
            votes: form.votes.into_iter().map(Vote::from).collect(),
        }
    }
}

/// Patch form for a blog, the only editable fields
#[derive(Serialize, Deserialize, ToSchema)]
pub(in crate::views) struct BlogPatchForm {
    pub title: String,
    pub description: String,
    pub image: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub(in crate::views) struct VoteForm {
    pub is_upvote: bool,
    pub user_id: u32,
    #[serde(default = "now")]
    pub creation_time: DateTime<Utc>,
}

impl From<VoteForm> for Vote {
    fn from(form: VoteForm) -> Self {
        Vote {
            id: None,
            is_upvote: form.is_upvote,
            user_id: form.user_id,
            creation_time: stored_precision(form.creation_time),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub(in crate::views) struct VotePatchForm {
    pub is_upvote: bool,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub(in crate::views) struct CommentForm {
    pub user_id: u32,
    #[serde(default)]
    pub username: String,
    pub text: String,
    #[serde(default = "now")]
    pub creation_time: DateTime<Utc>,
    #[serde(default = "now")]
    pub last_modification: DateTime<Utc>,
}

impl From<CommentForm> for Comment {
    fn from(form: CommentForm) -> Self {
        Comment {
            id: None,
            user_id: form.user_id,
            username: form.username,
            text: form.text,
            creation_time: stored_precision(form.creation_time),
            last_modification: stored_precision(form.last_modification),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub(in crate::views) struct CommentPatchForm {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize))]
pub struct VoteResponse {
    /// Votes only have an identifier when one was stored with them
    pub id: Option<String>,
    pub is_upvote: bool,
    pub user_id: u32,
    pub creation_time: DateTime<Utc>,
}

impl From<Vote> for VoteResponse {
    fn from(vote: Vote) -> Self {
        Self {
            id: vote.id.map(|id| id.to_hex()),
            is_upvote: vote.is_upvote,
            user_id: vote.user_id,
            creation_time: vote.creation_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize))]
pub struct CommentResponse {
    pub id: Option<String>,
    pub user_id: u32,
    pub username: String,
    pub text: String,
    pub creation_time: DateTime<Utc>,
    pub last_modification: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.map(|id| id.to_hex()),
            user_id: comment.user_id,
            username: comment.username,
            text: comment.text,
            creation_time: comment.creation_time,
            last_modification: comment.last_modification,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize))]
pub struct BlogResponse {
    pub id: String,
    pub user_id: u32,
    pub username: String,
    pub title: String,
    pub description: String,
    pub creation_time: DateTime<Utc>,
    #[schema(value_type = i32, minimum = 0, maximum = 4)]
    pub status: Status,
    pub image: String,
    #[schema(value_type = i32, minimum = 0, maximum = 6)]
    pub category: Category,
    pub comments: Vec<CommentResponse>,
    pub votes: Vec<VoteResponse>,
}

impl From<Blog> for BlogResponse {
    fn from(blog: Blog) -> Self {
        Self {
            id: blog.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: blog.user_id,
            username: blog.username,
            title: blog.title,
            description: blog.description,
            creation_time: blog.creation_time,
            status: blog.status,
            image: blog.image,
            category: blog.category,
            comments: blog.comments.into_iter().map(Into::into).collect(),
            votes: blog.votes.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize))]
pub struct VotesCount {
    /// Upvotes minus downvotes
    pub count: i64,
}

// Documentation structs
#[derive(IntoParams)]
#[into_params(parameter_in = Path)]
#[allow(unused)]
pub struct BlogIdParam {
    /// The id of a blog
    blog_id: String,
}

#[derive(IntoParams)]
#[into_params(parameter_in = Path)]
#[allow(unused)]
pub struct VoteIndexParam {
    blog_id: String,
    /// The position of the vote, votes are padded with default ones up to it
    index: usize,
}

#[derive(IntoParams)]
#[into_params(parameter_in = Path)]
#[allow(unused)]
pub struct CommentIndexParam {
    blog_id: String,
    /// The position of the comment
    comment: usize,
}

#[derive(IntoParams)]
#[into_params(parameter_in = Path)]
#[allow(unused)]
pub struct CommentIdParam {
    blog_id: String,
    /// The id of the comment
    comment: String,
}

fn blog_list(blogs: Vec<Blog>) -> Json<Vec<BlogResponse>> {
    Json(blogs.into_iter().map(BlogResponse::from).collect())
}

/// List every blog
#[utoipa::path(
    get, path = "/blogs",
    tag = "blogs",
    responses(
        (status = 200, body = Vec<BlogResponse>, description = "Every blog"),
    )
)]
pub(in crate::views) async fn list(
    State(repository): State<BlogRepository>,
) -> Result<Json<Vec<BlogResponse>>> {
    Ok(blog_list(repository.get_all().await?))
}

/// Create a blog
#[utoipa::path(
    post, path = "/blogs",
    tag = "blogs",
    request_body = BlogCreateForm,
    responses(
        (status = 201, body = BlogResponse, description = "The created blog"),
    )
)]
pub(in crate::views) async fn create(
    State(repository): State<BlogRepository>,
    Json(form): Json<BlogCreateForm>,
) -> Result<impl IntoResponse> {
    let mut blog = Blog::from(form);
    repository.insert(&mut blog).await?;
    Ok((StatusCode::CREATED, Json(BlogResponse::from(blog))))
}

/// Retrieve a blog
#[utoipa::path(
    get, path = "/blogs/{blog_id}",
    tag = "blogs",
    params(BlogIdParam),
    responses(
        (status = 200, body = BlogResponse, description = "The requested blog"),
        (status = 404, body = crate::error::InternalError, description = "The blog does not exist"),
    )
)]
pub(in crate::views) async fn get(
    State(repository): State<BlogRepository>,
    Path(blog_id): Path<String>,
) -> Result<Json<BlogResponse>> {
    let blog = repository.get(&blog_id).await?;
    Ok(Json(blog.into()))
}

/// Update the title, description and image of a blog
#[utoipa::path(
    patch, path = "/blogs/{blog_id}",
    tag = "blogs",
    params(BlogIdParam),
    request_body(
        content = BlogPatchForm,
        description = "The fields to update"
    ),
    responses(
        (status = 200, body = BlogResponse, description = "The updated blog"),
    )
)]
pub(in crate::views) async fn patch(
    State(repository): State<BlogRepository>,
    Path(blog_id): Path<String>,
    Json(form): Json<BlogPatchForm>,
) -> Result<Json<BlogResponse>> {
    let changes = Blog {
        title: form.title,
        description: form.description,
        image: form.image,
        ..Default::default()
    };
    repository.update(&blog_id, &changes).await?;
    let blog = repository.get(&blog_id).await?;
    Ok(Json(blog.into()))
}

/// Delete a blog along with its comments and votes
#[utoipa::path(
    delete, path = "/blogs/{blog_id}",
    tag = "blogs",
    params(BlogIdParam),
    responses(
        (status = 204, description = "The blog was deleted successfully"),
    )
)]
pub(in crate::views) async fn delete(
    State(repository): State<BlogRepository>,
    Path(blog_id): Path<String>,
) -> Result<impl IntoResponse> {
    repository.delete(&blog_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the blogs of an author
#[utoipa::path(
    get, path = "/blogs/author/{user_id}",
    tag = "blogs",
    params(("user_id" = u32, Path, description = "The id of the author")),
    responses(
        (status = 200, body = Vec<BlogResponse>, description = "The blogs of the author"),
    )
)]
pub(in crate::views) async fn list_by_author(
    State(repository): State<BlogRepository>,
    Path(user_id): Path<u32>,
) -> Result<Json<Vec<BlogResponse>>> {
    Ok(blog_list(repository.get_by_author_id(user_id).await?))
}

/// List the blogs with a given status
#[utoipa::path(
    get, path = "/blogs/status/{status}",
    tag = "blogs",
    params(("status" = i32, Path, description = "The status code, from 0 (draft) to 4 (famous)")),
    responses(
        (status = 200, body = Vec<BlogResponse>, description = "The blogs with this status"),
        (status = 400, body = crate::error::InternalError, description = "Unknown status code"),
    )
)]
pub(in crate::views) async fn list_by_status(
    State(repository): State<BlogRepository>,
    Path(status): Path<i32>,
) -> Result<Json<Vec<BlogResponse>>> {
    let status = Status::try_from(status)?;
    Ok(blog_list(repository.get_by_status(status).await?))
}

/// List the votes of a blog
#[utoipa::path(
    get, path = "/blogs/{blog_id}/votes",
    tags = ["blogs", "votes"],
    params(BlogIdParam),
    responses(
        (status = 200, body = Vec<VoteResponse>, description = "The votes of the blog"),
    )
)]
pub(in crate::views) async fn votes(
    State(repository): State<BlogRepository>,
    Path(blog_id): Path<String>,
) -> Result<Json<Vec<VoteResponse>>> {
    let blog = repository.get(&blog_id).await?;
    Ok(Json(blog.votes.into_iter().map(Into::into).collect()))
}

/// Count the votes of a blog
#[utoipa::path(
    get, path = "/blogs/{blog_id}/votes/count",
    tags = ["blogs", "votes"],
    params(BlogIdParam),
    responses(
        (status = 200, body = VotesCount, description = "Upvotes minus downvotes"),
    )
)]
pub(in crate::views) async fn votes_count(
    State(repository): State<BlogRepository>,
    Path(blog_id): Path<String>,
) -> Result<Json<VotesCount>> {
    let blog = repository.get(&blog_id).await?;
    Ok(Json(VotesCount {
        count: blog.votes_count(),
    }))
}

/// Vote for a blog
#[utoipa::path(
    post, path = "/blogs/{blog_id}/votes",
    tags = ["blogs", "votes"],
    params(BlogIdParam),
    request_body = VoteForm,
    responses(
        (status = 201, body = VoteResponse, description = "The added vote"),
    )
)]
pub(in crate::views) async fn add_vote(
    State(repository): State<BlogRepository>,
    Path(blog_id): Path<String>,
    Json(form): Json<VoteForm>,
) -> Result<impl IntoResponse> {
    let vote = Vote::from(form);
    repository.add_vote(&blog_id, &vote).await?;
    Ok((StatusCode::CREATED, Json(VoteResponse::from(vote))))
}

/// Change the flag of a vote
#[utoipa::path(
    put, path = "/blogs/{blog_id}/votes/{index}",
    tags = ["blogs", "votes"],
    params(VoteIndexParam),
    request_body = VotePatchForm,
    responses(
        (status = 200, body = Vec<VoteResponse>, description = "The votes of the blog after the change"),
    )
)]
pub(in crate::views) async fn change_vote(
    State(repository): State<BlogRepository>,
    Path((blog_id, index)): Path<(String, usize)>,
    Json(form): Json<VotePatchForm>,
) -> Result<Json<Vec<VoteResponse>>> {
    let vote = Vote {
        is_upvote: form.is_upvote,
        ..Default::default()
    };
    repository.change_vote(&blog_id, index, &vote).await?;
    let blog = repository.get(&blog_id).await?;
    Ok(Json(blog.votes.into_iter().map(Into::into).collect()))
}

/// Comment a blog
#[utoipa::path(
    post, path = "/blogs/{blog_id}/comments",
    tags = ["blogs", "comments"],
    params(BlogIdParam),
    request_body = CommentForm,
    responses(
        (status = 201, body = CommentResponse, description = "The added comment with its id"),
    )
)]
pub(in crate::views) async fn add_comment(
    State(repository): State<BlogRepository>,
    Path(blog_id): Path<String>,
    Json(form): Json<CommentForm>,
) -> Result<impl IntoResponse> {
    let mut comment = Comment::from(form);
    repository.add_comment(&blog_id, &mut comment).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

/// Change the text of a comment
#[utoipa::path(
    put, path = "/blogs/{blog_id}/comments/{comment}",
    tags = ["blogs", "comments"],
    params(CommentIndexParam),
    request_body = CommentPatchForm,
    responses(
        (status = 200, body = Vec<CommentResponse>, description = "The comments of the blog after the change"),
    )
)]
pub(in crate::views) async fn update_comment(
    State(repository): State<BlogRepository>,
    Path((blog_id, index)): Path<(String, usize)>,
    Json(form): Json<CommentPatchForm>,
) -> Result<Json<Vec<CommentResponse>>> {
    let comment = Comment {
        text: form.text,
        ..Default::default()
    };
    repository.update_comment(&blog_id, index, &comment).await?;
    let blog = repository.get(&blog_id).await?;
    Ok(Json(blog.comments.into_iter().map(Into::into).collect()))
}

/// Delete a comment
///
/// Deleting a comment the blog doesn't have succeeds.
#[utoipa::path(
    delete, path = "/blogs/{blog_id}/comments/{comment}",
    tags = ["blogs", "comments"],
    params(CommentIdParam),
    responses(
        (status = 204, description = "The comment is no longer part of the blog"),
    )
)]
pub(in crate::views) async fn delete_comment(
    State(repository): State<BlogRepository>,
    Path((blog_id, comment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    repository.delete_comment(&blog_id, &comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
