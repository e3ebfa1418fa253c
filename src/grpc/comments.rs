use blogs_models::BlogRepository;
use blogs_proto::blog::AddCommentRequest;
use blogs_proto::blog::CommentResponse;
use blogs_proto::blog::DeleteCommentRequest;
use blogs_proto::blog::UpdateCommentRequest;

use super::required;
use crate::error::Result;

/// Answers with the stored comment, identifier included
pub(super) async fn add_comment(
    repository: &BlogRepository,
    AddCommentRequest { id, comment }: AddCommentRequest,
) -> Result<CommentResponse> {
    let mut comment = blogs_models::Comment::from(required(comment, "comment")?);
    repository.add_comment(&id, &mut comment).await?;
    Ok(CommentResponse {
        comment: Some(comment.into()),
    })
}

/// Sets the text of the comment at `index`
pub(super) async fn update_comment(
    repository: &BlogRepository,
    UpdateCommentRequest { id, index, comment }: UpdateCommentRequest,
) -> Result<CommentResponse> {
    let comment = blogs_models::Comment::from(required(comment, "comment")?);
    repository
        .update_comment(&id, index as usize, &comment)
        .await?;
    Ok(CommentResponse {
        comment: Some(comment.into()),
    })
}

pub(super) async fn delete_comment(
    repository: &BlogRepository,
    DeleteCommentRequest { id, comment_id }: DeleteCommentRequest,
) -> Result<CommentResponse> {
    repository.delete_comment(&id, &comment_id).await?;
    Ok(CommentResponse { comment: None })
}
