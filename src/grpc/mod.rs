//! The `blog.BlogService` gRPC service
//!
//! Every RPC decodes its request, runs one or two [BlogRepository] operations and maps the
//! result back to wire messages. Errors go through [InternalError] to pick their gRPC code.

mod blogs;
mod comments;
mod votes;

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;

use axum::http::StatusCode;
use blogs_models::BlogRepository;
use blogs_proto::blog::AddCommentRequest;
use blogs_proto::blog::AddVoteRequest;
use blogs_proto::blog::BlogResponse;
use blogs_proto::blog::ChangeVoteRequest;
use blogs_proto::blog::CommentResponse;
use blogs_proto::blog::CreateBlogRequest;
use blogs_proto::blog::DeleteCommentRequest;
use blogs_proto::blog::GetAllRequest;
use blogs_proto::blog::GetAllVotesResponse;
use blogs_proto::blog::GetBlogsResponse;
use blogs_proto::blog::GetByIdRequest;
use blogs_proto::blog::GetByStatusRequest;
use blogs_proto::blog::GetVotesCountResponse;
use blogs_proto::blog::UpdateBlogRequest;
use blogs_proto::blog::UpdateCommentRequest;
use blogs_proto::blog::VoteResponse;
use blogs_proto::blog::blog_service_server::BlogService;
use blogs_proto::blog::blog_service_server::BlogServiceServer;
use serde_json::Value;
use serde_json::json;
use tracing::info;

use crate::error::BlogsError;
use crate::error::InternalError;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("the request has no '{field}'")]
    MissingField { field: &'static str },
    #[error("'{value}' is not a valid author id")]
    InvalidAuthorId {
        value: String,
        source: std::num::ParseIntError,
    },
}

impl BlogsError for RequestError {
    fn get_status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn get_type(&self) -> &str {
        match self {
            Self::MissingField { .. } => "blogs:grpc:MissingField",
            Self::InvalidAuthorId { .. } => "blogs:grpc:InvalidAuthorId",
        }
    }

    fn context(&self) -> HashMap<String, Value> {
        match self {
            Self::MissingField { field } => [("field".to_owned(), json!(field))].into(),
            Self::InvalidAuthorId { value, .. } => [("value".to_owned(), json!(value))].into(),
        }
    }
}

/// Unwraps an optional message field of a request
fn required<T>(message: Option<T>, field: &'static str) -> Result<T, RequestError> {
    message.ok_or(RequestError::MissingField { field })
}

#[derive(Clone)]
pub struct BlogGrpcService {
    repository: BlogRepository,
}

impl BlogGrpcService {
    pub fn new(repository: BlogRepository) -> Self {
        Self { repository }
    }
}

type RpcResult<T> = Result<tonic::Response<T>, tonic::Status>;

fn respond<T>(result: Result<T, InternalError>) -> RpcResult<T> {
    result.map(tonic::Response::new).map_err(Into::into)
}

#[tonic::async_trait]
impl BlogService for BlogGrpcService {
    async fn get_all_blogs(&self, _: tonic::Request<GetAllRequest>) -> RpcResult<GetBlogsResponse> {
        respond(blogs::get_all_blogs(&self.repository).await)
    }

    async fn get_blog_by_id(
        &self,
        request: tonic::Request<GetByIdRequest>,
    ) -> RpcResult<BlogResponse> {
        respond(blogs::get_blog_by_id(&self.repository, request.into_inner()).await)
    }

    async fn get_blogs_by_author_id(
        &self,
        request: tonic::Request<GetByIdRequest>,
    ) -> RpcResult<GetBlogsResponse> {
        respond(blogs::get_blogs_by_author_id(&self.repository, request.into_inner()).await)
    }

    async fn get_blogs_by_status(
        &self,
        request: tonic::Request<GetByStatusRequest>,
    ) -> RpcResult<GetBlogsResponse> {
        respond(blogs::get_blogs_by_status(&self.repository, request.into_inner()).await)
    }

    async fn post_blog(&self, request: tonic::Request<CreateBlogRequest>) -> RpcResult<BlogResponse> {
        respond(blogs::post_blog(&self.repository, request.into_inner()).await)
    }

    async fn update_blog(
        &self,
        request: tonic::Request<UpdateBlogRequest>,
    ) -> RpcResult<BlogResponse> {
        respond(blogs::update_blog(&self.repository, request.into_inner()).await)
    }

    async fn delete_blog(&self, request: tonic::Request<GetByIdRequest>) -> RpcResult<BlogResponse> {
        respond(blogs::delete_blog(&self.repository, request.into_inner()).await)
    }

    async fn get_all_votes(
        &self,
        request: tonic::Request<GetByIdRequest>,
    ) -> RpcResult<GetAllVotesResponse> {
        respond(votes::get_all_votes(&self.repository, request.into_inner()).await)
    }

    async fn get_votes_count(
        &self,
        request: tonic::Request<GetByIdRequest>,
    ) -> RpcResult<GetVotesCountResponse> {
        respond(votes::get_votes_count(&self.repository, request.into_inner()).await)
    }

    async fn add_vote(&self, request: tonic::Request<AddVoteRequest>) -> RpcResult<VoteResponse> {
        respond(votes::add_vote(&self.repository, request.into_inner()).await)
    }

    async fn change_vote(
        &self,
        request: tonic::Request<ChangeVoteRequest>,
    ) -> RpcResult<VoteResponse> {
        respond(votes::change_vote(&self.repository, request.into_inner()).await)
    }

    async fn add_comment(
        &self,
        request: tonic::Request<AddCommentRequest>,
    ) -> RpcResult<CommentResponse> {
        respond(comments::add_comment(&self.repository, request.into_inner()).await)
    }

    async fn update_comment(
        &self,
        request: tonic::Request<UpdateCommentRequest>,
    ) -> RpcResult<CommentResponse> {
        respond(comments::update_comment(&self.repository, request.into_inner()).await)
    }

    async fn delete_comment(
        &self,
        request: tonic::Request<DeleteCommentRequest>,
    ) -> RpcResult<CommentResponse> {
        respond(comments::delete_comment(&self.repository, request.into_inner()).await)
    }
}

/// Serves the blog service, along with the health and reflection services, until `shutdown`
/// completes
///
/// In-flight calls are drained before returning.
pub async fn serve(
    address: SocketAddr,
    repository: BlogRepository,
    shutdown: impl Future<Output = ()> + Send,
) -> anyhow::Result<()> {
    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(blogs_proto::FILE_DESCRIPTOR_SET)
        .register_encoded_file_descriptor_set(tonic_health::pb::FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<BlogServiceServer<BlogGrpcService>>()
        .await;

    info!(%address, "Running gRPC server...");
    tonic::transport::Server::builder()
        .trace_fn(|request| tracing::info_span!("grpc", path = %request.uri().path()))
        .add_service(health_service)
        .add_service(reflection)
        .add_service(BlogServiceServer::new(BlogGrpcService::new(repository)))
        .serve_with_shutdown(address, shutdown)
        .await?;
    info!("gRPC server stopped");
    Ok(())
}
