use blogs_models::BlogRepository;
use blogs_proto::blog as wire;
use blogs_proto::blog::AddVoteRequest;
use blogs_proto::blog::ChangeVoteRequest;
use blogs_proto::blog::GetAllVotesResponse;
use blogs_proto::blog::GetByIdRequest;
use blogs_proto::blog::GetVotesCountResponse;
use blogs_proto::blog::VoteResponse;

use super::required;
use crate::error::Result;

pub(super) async fn get_all_votes(
    repository: &BlogRepository,
    GetByIdRequest { id }: GetByIdRequest,
) -> Result<GetAllVotesResponse> {
    let blog = repository.get(&id).await?;
    Ok(GetAllVotesResponse {
        votes: blog.votes.into_iter().map(wire::Vote::from).collect(),
    })
}

/// Upvotes minus downvotes
pub(super) async fn get_votes_count(
    repository: &BlogRepository,
    GetByIdRequest { id }: GetByIdRequest,
) -> Result<GetVotesCountResponse> {
    let blog = repository.get(&id).await?;
    Ok(GetVotesCountResponse {
        count: blog.votes_count(),
    })
}

pub(super) async fn add_vote(
    repository: &BlogRepository,
    AddVoteRequest { id, vote }: AddVoteRequest,
) -> Result<VoteResponse> {
    let vote = blogs_models::Vote::from(required(vote, "vote")?);
    repository.add_vote(&id, &vote).await?;
    Ok(VoteResponse {
        vote: Some(vote.into()),
    })
}

/// Sets the flag of the vote at `index`, an index past the last vote pads the votes with
/// default ones
pub(super) async fn change_vote(
    repository: &BlogRepository,
    ChangeVoteRequest { id, index, vote }: ChangeVoteRequest,
) -> Result<VoteResponse> {
    let vote = blogs_models::Vote::from(required(vote, "vote")?);
    repository.change_vote(&id, index as usize, &vote).await?;
    Ok(VoteResponse {
        vote: Some(vote.into()),
    })
}
