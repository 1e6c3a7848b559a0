use crate::error::Error;
use crate::ids::generate_ids;
use crate::layout::LabelSheet;
use crate::model::RecordSet;
use crate::records::{ExtractOptions, extract_cells, extract_delimited};
use crate::xlsx;
use crate::{Export, export_labels};

/// What the front end should show.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
    /// Nothing loaded, or the last input had no data rows.
    #[default]
    Empty,
    Loaded(RecordSet),
}

/// Owns the current record set. Each load replaces it wholesale.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn records(&self) -> Option<&RecordSet> {
        match &self.state {
            SessionState::Loaded(set) => Some(set),
            SessionState::Empty => None,
        }
    }

    /// `None` (no data rows) leaves the session empty.
    pub fn loaded(&mut self, records: Option<RecordSet>) -> &SessionState {
        self.state = match records {
            Some(set) => SessionState::Loaded(set),
            None => {
                log::info!("No data loaded");
                SessionState::Empty
            }
        };
        &self.state
    }

    pub fn cleared(&mut self) {
        self.state = SessionState::Empty;
    }

    pub fn reset_on_error(&mut self, err: &Error) {
        log::error!("Resetting after error: {err}");
        self.state = SessionState::Empty;
    }

    pub fn load_paste(&mut self, text: &str, opts: &ExtractOptions) -> &SessionState {
        self.loaded(extract_delimited(text, opts))
    }

    pub fn load_workbook<S: AsRef<str>>(
        &mut self,
        data: &[u8],
        sheet_names: &[S],
        opts: &ExtractOptions,
    ) -> Result<&SessionState, Error> {
        match xlsx::read_sheet_bytes(data, sheet_names) {
            Ok(cells) => Ok(self.loaded(cells.and_then(|c| extract_cells(&c, opts)))),
            Err(e) => {
                self.reset_on_error(&e);
                Err(e)
            }
        }
    }

    pub fn load_generated(&mut self, count: usize) -> &SessionState {
        let ids = generate_ids(count);
        self.loaded(Some(RecordSet::from_identifiers(&ids)))
    }

    /// Render the loaded records. Any render failure resets the session;
    /// nothing partial is returned. Having nothing to print leaves the state
    /// as it is.
    pub fn export(&mut self, sheet: &LabelSheet, url_prefix: &str) -> Result<Export, Error> {
        let Some(set) = self.records() else {
            return Err(Error::Config("no records loaded".into()));
        };
        if set.is_empty() {
            return Err(Error::Config("every loaded row was filtered out".into()));
        }
        let result = export_labels(set, sheet, url_prefix);
        if let Err(e) = &result {
            self.reset_on_error(e);
        }
        result
    }
}
