use anyhow::Result;
use bpaf::Bpaf;
use dog_search_sdk::models::query::INTENT_FIELD;
use dog_search_sdk::models::submission::FormSubmission;
use tracing::debug;

/// Value the browser submits for a checked checkbox
const CHECKED: &str = "on";

/// Resolve a submission of the breed filter form to the page it leads to
#[derive(Debug, Bpaf, Clone)]
pub struct Filter {
    /// Checked form field, e.g. 'Cairn_Terrier'
    ///
    /// Can be given multiple times.
    #[bpaf(long("field"), argument("NAME"), many)]
    fields: Vec<String>,

    /// Which button submitted the form, 'submit' or 'delete'
    #[bpaf(long, argument("INTENT"))]
    intent: Option<String>,

    /// Raw form body, e.g. 'Beagle=on&intent=submit', instead of '--field'
    #[bpaf(long, argument("BODY"))]
    body: Option<String>,
}

impl Filter {
    pub fn handle(self) -> Result<()> {
        let submission = self.submission();
        debug!(intent = %submission.intent(), "resolving filter submission");
        println!("{}", submission.redirect());
        Ok(())
    }

    fn submission(self) -> FormSubmission {
        if let Some(body) = self.body {
            return FormSubmission::parse(&body);
        }

        let intent = self
            .intent
            .map(|intent| (INTENT_FIELD.to_string(), intent));
        FormSubmission::new(
            self.fields
                .into_iter()
                .map(|field| (field, CHECKED.to_string()))
                .chain(intent),
        )
    }
}
