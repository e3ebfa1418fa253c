//! Persistence of blogs in the `blogs` collection
//!
//! Comments and votes are embedded in their blog document: they are appended with `$push`,
//! modified through positional paths (`votes.<index>.isUpvote`) and comments are removed
//! with `$pull` on their identifier.
//!
//! A positional update past the end of a sequence is not rejected: the store backfills
//! the missing positions with `null`, which read back as default entries. Callers are
//! expected to check the index against the current sequence first.

use std::future::Future;
use std::time::Duration;

use bson::Document;
use bson::doc;
use bson::oid::ObjectId;
use database::Collection;
use database::DocumentStore;
use database::UpdateOutcome;
use tracing::debug;

use crate::Blog;
use crate::Comment;
use crate::Error;
use crate::Result;
use crate::Status;
use crate::Vote;

pub const BLOGS_COLLECTION: &str = "blogs";

/// Upper bound of every store round trip
pub const STORE_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct BlogRepository {
    collection: Collection,
}

fn parse_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|source| Error::InvalidId {
        id: id.to_owned(),
        source,
    })
}

async fn bounded<T>(operation: &'static str, future: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(STORE_OPERATION_TIMEOUT, future)
        .await
        .map_err(|_| Error::Timeout {
            operation,
            timeout: STORE_OPERATION_TIMEOUT,
        })?
}

fn decode_all(documents: Vec<Document>) -> Result<Vec<Blog>> {
    documents
        .into_iter()
        .map(|document| bson::from_document(document).map_err(Error::from))
        .collect()
}

impl BlogRepository {
    pub fn new(store: &DocumentStore) -> Self {
        Self {
            collection: store.collection(BLOGS_COLLECTION),
        }
    }

    /// Runs `update` on the blog `blog_id`, an unmatched blog is reported as not found
    async fn update_blog(&self, blog_id: &str, update: Document) -> Result<UpdateOutcome> {
        let id = parse_id(blog_id)?;
        let outcome = self.collection.update_one(doc! { "_id": id }, update).await?;
        if outcome.matched == 0 {
            return Err(Error::BlogNotFound {
                blog_id: blog_id.to_owned(),
            });
        }
        if outcome.modified == 0 {
            debug!(blog_id, "blog matched but left unmodified");
        }
        Ok(outcome)
    }

    #[tracing::instrument(name = "blogs:get_all", skip(self), err)]
    pub async fn get_all(&self) -> Result<Vec<Blog>> {
        bounded("get_all", async {
            decode_all(self.collection.find(doc! {}).await?)
        })
        .await
    }

    #[tracing::instrument(name = "blogs:get_by_author_id", skip(self), err)]
    pub async fn get_by_author_id(&self, user_id: u32) -> Result<Vec<Blog>> {
        bounded("get_by_author_id", async {
            decode_all(
                self.collection
                    .find(doc! { "userId": i64::from(user_id) })
                    .await?,
            )
        })
        .await
    }

    #[tracing::instrument(name = "blogs:get_by_status", skip(self), err)]
    pub async fn get_by_status(&self, status: Status) -> Result<Vec<Blog>> {
        bounded("get_by_status", async {
            decode_all(
                self.collection
                    .find(doc! { "status": status.code() })
                    .await?,
            )
        })
        .await
    }

    #[tracing::instrument(name = "blogs:get", skip(self), err)]
    pub async fn get(&self, blog_id: &str) -> Result<Blog> {
        bounded("get", async {
            let id = parse_id(blog_id)?;
            let document = self
                .collection
                .find_one(doc! { "_id": id })
                .await?
                .ok_or_else(|| Error::BlogNotFound {
                    blog_id: blog_id.to_owned(),
                })?;
            Ok(bson::from_document(document)?)
        })
        .await
    }

    /// Stores the whole blog and sets its identifier to the one generated by the store
    #[tracing::instrument(name = "blogs:insert", skip_all, fields(title = %blog.title), err)]
    pub async fn insert(&self, blog: &mut Blog) -> Result<ObjectId> {
        bounded("insert", async {
            blog.truncate_timestamps();
            let mut document = bson::to_document(&*blog)?;
            document.remove("_id");
            let inserted = self.collection.insert_one(document).await?;
            let id: ObjectId = bson::from_bson(inserted)?;
            blog.id = Some(id);
            Ok(id)
        })
        .await
    }

    /// Overwrites the title, description and image of a blog
    ///
    /// Every other field of `blog` is ignored, comments and votes included.
    #[tracing::instrument(name = "blogs:update", skip(self, blog), err)]
    pub async fn update(&self, blog_id: &str, blog: &Blog) -> Result<UpdateOutcome> {
        bounded("update", async {
            let update = doc! {
                "$set": {
                    "title": blog.title.as_str(),
                    "description": blog.description.as_str(),
                    "image": blog.image.as_str(),
                }
            };
            self.update_blog(blog_id, update).await
        })
        .await
    }

    /// Removes a blog with its comments and votes
    #[tracing::instrument(name = "blogs:delete", skip(self), err)]
    pub async fn delete(&self, blog_id: &str) -> Result<()> {
        bounded("delete", async {
            let id = parse_id(blog_id)?;
            match self.collection.delete_one(doc! { "_id": id }).await? {
                0 => Err(Error::BlogNotFound {
                    blog_id: blog_id.to_owned(),
                }),
                _ => Ok(()),
            }
        })
        .await
    }

    #[tracing::instrument(name = "blogs:add_vote", skip(self, vote), err)]
    pub async fn add_vote(&self, blog_id: &str, vote: &Vote) -> Result<UpdateOutcome> {
        bounded("add_vote", async {
            let update = doc! { "$push": { "votes": bson::to_bson(vote)? } };
            self.update_blog(blog_id, update).await
        })
        .await
    }

    /// Sets the flag of the vote at `index`, the other fields of `vote` are ignored
    #[tracing::instrument(name = "blogs:change_vote", skip(self, vote), err)]
    pub async fn change_vote(
        &self,
        blog_id: &str,
        index: usize,
        vote: &Vote,
    ) -> Result<UpdateOutcome> {
        bounded("change_vote", async {
            let mut set = Document::new();
            set.insert(format!("votes.{index}.isUpvote"), vote.is_upvote);
            self.update_blog(blog_id, doc! { "$set": set }).await
        })
        .await
    }

    /// Gives `comment` a new identifier and appends it to the blog comments
    #[tracing::instrument(name = "blogs:add_comment", skip(self, comment), err)]
    pub async fn add_comment(&self, blog_id: &str, comment: &mut Comment) -> Result<UpdateOutcome> {
        bounded("add_comment", async {
            comment.id = Some(ObjectId::new());
            comment.truncate_timestamps();
            let update = doc! { "$push": { "comments": bson::to_bson(&*comment)? } };
            self.update_blog(blog_id, update).await
        })
        .await
    }

    /// Sets the text of the comment at `index`, the other fields of `comment` are ignored
    #[tracing::instrument(name = "blogs:update_comment", skip(self, comment), err)]
    pub async fn update_comment(
        &self,
        blog_id: &str,
        index: usize,
        comment: &Comment,
    ) -> Result<UpdateOutcome> {
        bounded("update_comment", async {
            let mut set = Document::new();
            set.insert(format!("comments.{index}.text"), comment.text.as_str());
            self.update_blog(blog_id, doc! { "$set": set }).await
        })
        .await
    }

    /// Removes the comment `comment_id` from a blog
    ///
    /// Deleting a comment the blog doesn't have is a no-op.
    #[tracing::instrument(name = "blogs:delete_comment", skip(self), err)]
    pub async fn delete_comment(&self, blog_id: &str, comment_id: &str) -> Result<UpdateOutcome> {
        bounded("delete_comment", async {
            let comment_id = parse_id(comment_id)?;
            let update = doc! { "$pull": { "comments": { "_id": comment_id } } };
            self.update_blog(blog_id, update).await
        })
        .await
    }
}
