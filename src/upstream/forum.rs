//! Forum service: questions, answers, votes, tags, blog posts, and comments.

// crates.io
use reqwest::Method;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	upstream::{UpstreamRequest, endpoint},
};

/// Direction of a question vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteType {
	/// Upvote.
	Up,
	/// Downvote.
	Down,
}
impl VoteType {
	/// Returns the wire label expected by the forum service.
	pub const fn as_str(self) -> &'static str {
		match self {
			VoteType::Up => "UP",
			VoteType::Down => "DOWN",
		}
	}
}
impl FromStr for VoteType {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"UP" => Ok(VoteType::Up),
			"DOWN" => Ok(VoteType::Down),
			_ => Err(Error::InvalidRequest {
				status: 403,
				reason: "voteType search parameter value can only be UP or DOWN".into(),
			}),
		}
	}
}

/// Endpoint catalogue for the forum service.
#[derive(Clone, Copy, Debug)]
pub struct ForumApi<'a> {
	base: &'a Url,
}
impl<'a> ForumApi<'a> {
	/// Creates a view rooted at the forum service base URL.
	pub fn new(base: &'a Url) -> Self {
		Self { base }
	}

	/// `GET /questions?page&tagId`.
	pub fn list_questions(&self, page: u32, tag_id: Option<&str>) -> Result<UpstreamRequest> {
		let mut request = self.get("forum.list_questions", &["questions"])?.query("page", page.to_string());

		if let Some(tag_id) = tag_id {
			request = request.query("tagId", tag_id);
		}

		Ok(request)
	}

	/// `GET /questions/{id}`.
	pub fn question(&self, question_id: &str) -> Result<UpstreamRequest> {
		self.get("forum.question", &["questions", question_id])
	}

	/// `POST /questions`.
	pub fn create_question(&self, body: Value) -> Result<UpstreamRequest> {
		Ok(self.call("forum.create_question", Method::POST, &["questions"])?.json(body))
	}

	/// `GET /questions/{id}/answers`.
	pub fn answers(&self, question_id: &str) -> Result<UpstreamRequest> {
		self.get("forum.answers", &["questions", question_id, "answers"])
	}

	/// `POST /questions/{id}/answers`.
	pub fn create_answer(&self, question_id: &str, body: Value) -> Result<UpstreamRequest> {
		Ok(self
			.call("forum.create_answer", Method::POST, &["questions", question_id, "answers"])?
			.json(body))
	}

	/// `DELETE /questions/{id}/answers/{answerId}`.
	pub fn delete_answer(&self, question_id: &str, answer_id: &str) -> Result<UpstreamRequest> {
		self.call("forum.delete_answer", Method::DELETE, &[
			"questions",
			question_id,
			"answers",
			answer_id,
		])
	}

	/// `POST /questions/{id}/votes?voteType`.
	pub fn vote(&self, question_id: &str, vote: VoteType) -> Result<UpstreamRequest> {
		Ok(self
			.call("forum.vote", Method::POST, &["questions", question_id, "votes"])?
			.query("voteType", vote.as_str()))
	}

	/// `DELETE /questions/{id}/votes`.
	pub fn delete_vote(&self, question_id: &str) -> Result<UpstreamRequest> {
		self.call("forum.delete_vote", Method::DELETE, &["questions", question_id, "votes"])
	}

	/// `GET /tags`.
	pub fn tags(&self) -> Result<UpstreamRequest> {
		self.get("forum.tags", &["tags"])
	}

	/// `GET /posts`.
	pub fn posts(&self) -> Result<UpstreamRequest> {
		self.get("forum.posts", &["posts"])
	}

	/// `POST /posts`.
	pub fn create_post(&self, body: Value) -> Result<UpstreamRequest> {
		Ok(self.call("forum.create_post", Method::POST, &["posts"])?.json(body))
	}

	/// `GET /posts/{id}`.
	pub fn post(&self, post_id: &str) -> Result<UpstreamRequest> {
		self.get("forum.post", &["posts", post_id])
	}

	/// `GET /posts/{id}/comments`.
	pub fn comments(&self, post_id: &str) -> Result<UpstreamRequest> {
		self.get("forum.comments", &["posts", post_id, "comments"])
	}

	/// `POST /posts/{id}/comments`.
	pub fn create_comment(&self, post_id: &str, body: Value) -> Result<UpstreamRequest> {
		Ok(self
			.call("forum.create_comment", Method::POST, &["posts", post_id, "comments"])?
			.json(body))
	}

	/// `DELETE /posts/{id}/comments/{commentId}`.
	pub fn delete_comment(&self, post_id: &str, comment_id: &str) -> Result<UpstreamRequest> {
		self.call("forum.delete_comment", Method::DELETE, &[
			"posts", post_id, "comments", comment_id,
		])
	}

	fn get(&self, operation: &'static str, segments: &[&str]) -> Result<UpstreamRequest> {
		self.call(operation, Method::GET, segments)
	}

	fn call(
		&self,
		operation: &'static str,
		method: Method,
		segments: &[&str],
	) -> Result<UpstreamRequest> {
		Ok(UpstreamRequest::new(operation, method, endpoint(self.base, segments)?))
	}
}
