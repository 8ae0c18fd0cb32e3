//! The concrete frames served by the HTTP layer.

use tracing::error;
use url::form_urlencoded;

use crate::application::roast::RoastOutcome;
use crate::application::signup::Eligibility;
use crate::domain::frame::{ButtonSpec, FrameBuilder, FrameDescriptor};

const COMPOSE_URL: &str = "https://warpcast.com/~/compose";
const SCORE_TITLE: &str = "Yup Score";
const SCORE_DESCRIPTION: &str = "Get your yup score with farcaster frame";
const SIGNUP_TITLE: &str = "Yup Signup";
const SIGNUP_DESCRIPTION: &str = "Check if you are eligible for yup with farcaster frame";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationTarget {
    pub address: String,
    pub amount: String,
    pub chain_id: String,
}

/// Absolute URLs and fixed labels used by every frame.
#[derive(Debug, Clone)]
pub struct FrameCatalog {
    host: String,
    author_link: String,
    donation: DonationTarget,
}

impl FrameCatalog {
    pub fn new(host: impl Into<String>, author_link: impl Into<String>, donation: DonationTarget) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        Self {
            host,
            author_link: author_link.into(),
            donation,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.host)
    }

    fn static_image(&self, id: &str) -> String {
        self.url(&format!("/images/static/{id}"))
    }

    fn roast_image(&self, id: &str) -> String {
        self.url(&format!("/images/static/gh-frame/{id}"))
    }

    fn author(&self) -> ButtonSpec {
        ButtonSpec::link("Author", &self.author_link)
    }

    pub fn score_initial(&self) -> FrameDescriptor {
        finish(
            FrameDescriptor::builder(SCORE_TITLE, self.static_image("score-base"), self.url("/frame/score"))
                .description(SCORE_DESCRIPTION)
                .button(ButtonSpec::navigate("Get My Yup Score")),
        )
    }

    pub fn score_result(&self, address: Option<&str>) -> FrameDescriptor {
        let image = match address {
            Some(address) => self.url(&format!("/images/score/address/{address}")),
            None => self.static_image("score-error"),
        };
        finish(
            FrameDescriptor::builder(SCORE_TITLE, image, self.url("/frame/score"))
                .description(SCORE_DESCRIPTION),
        )
    }

    pub fn eligibility_initial(&self) -> FrameDescriptor {
        finish(
            FrameDescriptor::builder(
                SIGNUP_TITLE,
                self.static_image("eligible-initial"),
                self.url("/frame/eligible"),
            )
            .description(SIGNUP_DESCRIPTION)
            .button(ButtonSpec::navigate("Check Eligibility")),
        )
    }

    pub fn eligibility_result(&self, eligibility: Eligibility) -> FrameDescriptor {
        let image = match eligibility {
            Eligibility::NoAddress => "eligible-error-no-fid",
            Eligibility::AlreadyRegistered => "eligible-error-account",
            Eligibility::Eligible => "eligible-yes",
            Eligibility::NotEligible => "eligible-no",
        };

        let builder = if eligibility == Eligibility::Eligible {
            let redirect = self.url("/frame/redirect/yup");
            FrameDescriptor::builder(SIGNUP_TITLE, self.static_image(image), redirect.clone())
                .button(ButtonSpec::link("Join Yup", redirect))
        } else {
            FrameDescriptor::builder(SIGNUP_TITLE, self.static_image(image), self.url("/frame/eligible"))
        };
        finish(builder.description(SIGNUP_DESCRIPTION))
    }

    pub fn donate_initial(&self) -> FrameDescriptor {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("address", &self.donation.address)
            .append_pair("amount", &self.donation.amount)
            .append_pair("chainId", &self.donation.chain_id)
            .finish();
        let target = self.url(&format!("/frame/donate-tx?{query}"));
        let label = format!("Donate {} ETH", self.donation.amount);

        finish(
            FrameDescriptor::builder("Donate", self.static_image("donate-initial"), self.url("/frame/donate"))
                .button(ButtonSpec::tx(label, target, self.url("/frame/donate"))),
        )
    }

    pub fn donate_result(&self, transaction_sent: bool) -> FrameDescriptor {
        let image = if transaction_sent {
            "donate-success"
        } else {
            "donate-error"
        };
        finish(FrameDescriptor::builder(
            "Donate",
            self.static_image(image),
            self.url("/frame/donate"),
        ))
    }

    pub fn roast_initial(&self) -> FrameDescriptor {
        finish(
            FrameDescriptor::builder(
                "Roast",
                self.roast_image("base_init"),
                self.url("/frame/github-roast-generate"),
            )
            .text_input("Enter Github Profile")
            .button(ButtonSpec::navigate("ROAST"))
            .button(self.author()),
        )
    }

    /// Frame for a roast outcome. `render` turns roast text into an image URL;
    /// when it yields nothing the loading-error frame is shown instead.
    pub fn roast_result(
        &self,
        outcome: &RoastOutcome,
        render: impl FnOnce(&str) -> Option<String>,
    ) -> FrameDescriptor {
        let restart = self.url("/frame/github-roast");
        let builder = match outcome {
            RoastOutcome::Author => self.roast_error("Error", "error_author", "Try another profile"),
            RoastOutcome::InvalidProfile => {
                self.roast_error("Error", "error_invalid_gh_profile", "Try another profile")
            }
            RoastOutcome::GlobalLimit => {
                self.roast_error("Daily limit reached", "error_to_many_roasts", "Try again later")
            }
            RoastOutcome::IdentityLimit => FrameDescriptor::builder(
                "Daily limit reached",
                self.roast_image("error_to_many_roasts_fid"),
                restart,
            )
            .button(self.author()),
            RoastOutcome::NotFound { profile } => FrameDescriptor::builder(
                "Roast",
                self.roast_image("error_roast_not_found"),
                restart,
            )
            .button(ButtonSpec::navigate("Roast Another Profile"))
            .button(self.share(profile.as_str()))
            .button(self.author()),
            RoastOutcome::Processing { profile } => self.roast_loading(profile.as_str(), "Check if generated"),
            RoastOutcome::Unavailable { profile } => self.roast_loading(profile.as_str(), "Try again"),
            RoastOutcome::Ready {
                profile,
                roast,
                submitted,
            } => match render(roast.as_str()) {
                Some(image) => {
                    let again = if *submitted {
                        "Roast Another Profile"
                    } else {
                        "Roast some mfer"
                    };
                    FrameDescriptor::builder("Roast", image, restart)
                        .button(ButtonSpec::navigate(again))
                        .button(self.share(profile.as_str()))
                        .button(self.author())
                }
                None => self.roast_loading(profile.as_str(), "Try again"),
            },
        };
        finish(builder)
    }

    fn roast_error(&self, title: &str, image: &str, retry: &str) -> FrameBuilder {
        FrameDescriptor::builder(title, self.roast_image(image), self.url("/frame/github-roast"))
            .button(ButtonSpec::navigate(retry))
            .button(self.author())
    }

    fn roast_loading(&self, profile: &str, retry: &str) -> FrameBuilder {
        FrameDescriptor::builder(
            "Error loading",
            self.roast_image("error_loading"),
            self.url(&format!("/frame/github-roast/{profile}?page=loading")),
        )
        .button(ButtonSpec::navigate(retry))
        .button(self.author())
    }

    fn share(&self, profile: &str) -> ButtonSpec {
        ButtonSpec::link("Share This Roast", self.compose_intent(profile))
    }

    /// Compose link that pre-fills a cast embedding this profile's roast.
    pub fn compose_intent(&self, profile: &str) -> String {
        let message = format!(
            "Roast GitHub profiles, 10 roasts per FID.\nThis is the Roast of {profile}\n"
        );
        let embed = self.url(&format!("/frame/github-roast/{profile}"));
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("text", &message)
            .append_pair("embeds[]", &embed)
            .finish();
        format!("{COMPOSE_URL}?{query}")
    }
}

fn finish(builder: FrameBuilder) -> FrameDescriptor {
    let fallback = builder.clone();
    builder.build().unwrap_or_else(|err| {
        error!(target = "framecard::frames", error = %err, "frame failed validation");
        fallback.into_bare()
    })
}
