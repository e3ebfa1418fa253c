use blogs_models::BlogRepository;
use blogs_models::Status;
use blogs_proto::blog as wire;
use blogs_proto::blog::BlogResponse;
use blogs_proto::blog::CreateBlogRequest;
use blogs_proto::blog::GetBlogsResponse;
use blogs_proto::blog::GetByIdRequest;
use blogs_proto::blog::GetByStatusRequest;
use blogs_proto::blog::UpdateBlogRequest;

use super::RequestError;
use super::required;
use crate::error::Result;

fn blogs_response(blogs: Vec<blogs_models::Blog>) -> GetBlogsResponse {
    GetBlogsResponse {
        blogs: blogs.into_iter().map(wire::Blog::from).collect(),
    }
}

pub(super) async fn get_all_blogs(repository: &BlogRepository) -> Result<GetBlogsResponse> {
    let blogs = repository.get_all().await?;
    Ok(blogs_response(blogs))
}

pub(super) async fn get_blog_by_id(
    repository: &BlogRepository,
    GetByIdRequest { id }: GetByIdRequest,
) -> Result<BlogResponse> {
    let blog = repository.get(&id).await?;
    Ok(BlogResponse {
        blog: Some(blog.into()),
    })
}

/// The request identifier is the decimal user id of the author
pub(super) async fn get_blogs_by_author_id(
    repository: &BlogRepository,
    GetByIdRequest { id }: GetByIdRequest,
) -> Result<GetBlogsResponse> {
    let user_id = id
        .parse::<u32>()
        .map_err(|source| RequestError::InvalidAuthorId { value: id, source })?;
    let blogs = repository.get_by_author_id(user_id).await?;
    Ok(blogs_response(blogs))
}

pub(super) async fn get_blogs_by_status(
    repository: &BlogRepository,
    GetByStatusRequest { status }: GetByStatusRequest,
) -> Result<GetBlogsResponse> {
    let status = Status::try_from(status)?;
    let blogs = repository.get_by_status(status).await?;
    Ok(blogs_response(blogs))
}

pub(super) async fn post_blog(
    repository: &BlogRepository,
    CreateBlogRequest { blog }: CreateBlogRequest,
) -> Result<BlogResponse> {
    let mut blog = blogs_models::Blog::from(required(blog, "blog")?);
    repository.insert(&mut blog).await?;
    Ok(BlogResponse {
        blog: Some(blog.into()),
    })
}

/// Only the title, description and image of the request blog are written
pub(super) async fn update_blog(
    repository: &BlogRepository,
    UpdateBlogRequest { id, blog }: UpdateBlogRequest,
) -> Result<BlogResponse> {
    let blog = blogs_models::Blog::from(required(blog, "blog")?);
    repository.update(&id, &blog).await?;
    let updated = repository.get(&id).await?;
    Ok(BlogResponse {
        blog: Some(updated.into()),
    })
}

pub(super) async fn delete_blog(
    repository: &BlogRepository,
    GetByIdRequest { id }: GetByIdRequest,
) -> Result<BlogResponse> {
    repository.delete(&id).await?;
    Ok(BlogResponse { blog: None })
}

#[cfg(test)]
mod tests {
    use blogs_models::Category;
    use blogs_models::fixtures::simple_blog;
    use blogs_proto::blog::BlogStatus;
    use blogs_proto::blog::blog_service_server::BlogService;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::grpc::BlogGrpcService;
    use crate::grpc::tests::service;

    async fn post(service: &BlogGrpcService, blog: blogs_models::Blog) -> wire::Blog {
        service
            .post_blog(tonic::Request::new(CreateBlogRequest {
                blog: Some(blog.into()),
            }))
            .await
            .expect("blog should be created")
            .into_inner()
            .blog
            .expect("created blog should be returned")
    }

    #[tokio::test]
    async fn post_then_get() {
        let service = service();
        let created = post(&service, simple_blog()).await;
        assert!(!created.id.is_empty());

        let fetched = service
            .get_blog_by_id(tonic::Request::new(GetByIdRequest {
                id: created.id.clone(),
            }))
            .await
            .unwrap()
            .into_inner()
            .blog
            .unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.title, "Three days in Lisbon");
        assert_eq!(fetched.status(), BlogStatus::Published);
    }

    #[tokio::test]
    async fn post_without_blog() {
        let status = service()
            .post_blog(tonic::Request::new(CreateBlogRequest { blog: None }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[rstest]
    #[case::unknown("65f1c0a2e4b0a1b2c3d4e5f6", tonic::Code::NotFound)]
    #[case::malformed("not-an-id", tonic::Code::InvalidArgument)]
    #[tokio::test]
    async fn get_failures(#[case] id: &str, #[case] expected: tonic::Code) {
        let status = service()
            .get_blog_by_id(tonic::Request::new(GetByIdRequest { id: id.to_owned() }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), expected);
    }

    #[tokio::test]
    async fn blogs_by_author() {
        let service = service();
        post(&service, simple_blog()).await;
        post(
            &service,
            blogs_models::Blog {
                user_id: 8,
                ..simple_blog()
            },
        )
        .await;

        let blogs = service
            .get_blogs_by_author_id(tonic::Request::new(GetByIdRequest { id: "8".into() }))
            .await
            .unwrap()
            .into_inner()
            .blogs;
        assert_eq!(blogs.len(), 1);
        assert_eq!(blogs[0].user_id, 8);
    }

    #[rstest]
    #[case::negative("-3")]
    #[case::not_a_number("mia")]
    #[case::too_large("4294967296")]
    #[tokio::test]
    async fn blogs_by_invalid_author(#[case] id: &str) {
        let status = service()
            .get_blogs_by_author_id(tonic::Request::new(GetByIdRequest { id: id.to_owned() }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn blogs_by_status() {
        let service = service();
        post(&service, simple_blog()).await;
        post(
            &service,
            blogs_models::Blog {
                status: Status::Draft,
                category: Category::Culture,
                ..simple_blog()
            },
        )
        .await;

        let drafts = service
            .get_blogs_by_status(tonic::Request::new(GetByStatusRequest {
                status: BlogStatus::Draft.into(),
            }))
            .await
            .unwrap()
            .into_inner()
            .blogs;
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].status(), BlogStatus::Draft);

        let status = service
            .get_blogs_by_status(tonic::Request::new(GetByStatusRequest { status: 42 }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn update_returns_the_stored_blog() {
        let service = service();
        let created = post(&service, simple_blog()).await;

        let request = wire::Blog {
            title: "T2".into(),
            description: "D2".into(),
            image: "I2".into(),
            status: BlogStatus::Closed.into(),
            ..Default::default()
        };
        let updated = service
            .update_blog(tonic::Request::new(UpdateBlogRequest {
                id: created.id.clone(),
                blog: Some(request),
            }))
            .await
            .unwrap()
            .into_inner()
            .blog
            .unwrap();

        assert_eq!(
            updated,
            wire::Blog {
                title: "T2".into(),
                description: "D2".into(),
                image: "I2".into(),
                ..created
            }
        );
    }

    #[tokio::test]
    async fn update_unknown_blog() {
        let status = service()
            .update_blog(tonic::Request::new(UpdateBlogRequest {
                id: "65f1c0a2e4b0a1b2c3d4e5f6".into(),
                blog: Some(wire::Blog::default()),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn delete_then_get() {
        let service = service();
        let created = post(&service, simple_blog()).await;

        let response = service
            .delete_blog(tonic::Request::new(GetByIdRequest {
                id: created.id.clone(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(response.blog, None);

        let status = service
            .get_blog_by_id(tonic::Request::new(GetByIdRequest { id: created.id }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);
    }
}
