//! The registry that owns every collection and its answers.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use polars::prelude::DataFrame;
use tracing::{debug, info, warn};

use survey_ingest::{
    CsvTable, RawCollection, build_collection, parse_metadata_document, read_csv_table,
    read_metadata_file,
};
use survey_model::{
    FullId, GivenAnswer, IdRegistry, Identifiable, ModelError, Question, QuestionCollection,
    QuestionNode, ShortId,
};

use crate::frame::{ColumnNames, named_answers_frame};
use crate::{CoercionPolicy, ContainerError, DuplicatePolicy, Result, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Empty,
    MetadataLoaded,
    DataLoaded,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContainerState::Empty => "empty",
            ContainerState::MetadataLoaded => "holding metadata only",
            ContainerState::DataLoaded => "holding survey data",
        };
        f.write_str(label)
    }
}

/// Outcome of one metadata load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataReport {
    pub added: Vec<FullId>,
    pub replaced: Vec<FullId>,
    pub skipped: Vec<FullId>,
}

impl MetadataReport {
    fn merge(&mut self, other: MetadataReport) {
        self.added.extend(other.added);
        self.replaced.extend(other.replaced);
        self.skipped.extend(other.skipped);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCell {
    pub participant: String,
    pub question: FullId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line in the source, header included.
    pub row: usize,
    pub reason: String,
}

/// Outcome of loading survey data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub data_source: String,
    pub participants: usize,
    pub answers: usize,
    pub matched_columns: usize,
    pub ignored_columns: Vec<String>,
    pub skipped_rows: Vec<SkippedRow>,
    pub skipped_cells: Vec<SkippedCell>,
    /// Rows whose cells past the header width were dropped.
    pub truncated_rows: Vec<usize>,
}

/// A matched response column: where its question lives.
#[derive(Debug, Clone)]
struct ColumnSlot {
    column: usize,
    collection: usize,
    question: ShortId,
}

/// Every loaded collection, the responses and the settings they were read with.
///
/// Metadata may be loaded repeatedly until survey data arrives; survey data
/// is loaded exactly once. Afterwards the container is read-only.
#[derive(Debug)]
pub struct DataContainer {
    settings: Settings,
    collections: IndexMap<FullId, QuestionCollection>,
    registry: IdRegistry,
    participants: Vec<String>,
    data_source: Option<String>,
    state: ContainerState,
}

impl Default for DataContainer {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl DataContainer {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            collections: IndexMap::new(),
            registry: IdRegistry::new(),
            participants: Vec::new(),
            data_source: None,
            state: ContainerState::Empty,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> ContainerState {
        self.state
    }

    /// Name of the loaded response source, once survey data is in.
    pub fn data_source(&self) -> Option<&str> {
        self.data_source.as_deref()
    }

    /// Participant ids in row order.
    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    /// Collections in registration order.
    pub fn collections(&self) -> impl Iterator<Item = &QuestionCollection> {
        self.collections.values()
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.collections
            .values()
            .flat_map(QuestionCollection::questions)
    }

    /// Registers parsed metadata entries.
    ///
    /// Every entry is built and validated before anything is registered. A
    /// collection id that is already known is handled according to the
    /// duplicate policy.
    pub fn load_metadata(&mut self, entries: &[RawCollection]) -> Result<MetadataReport> {
        self.ensure_metadata_allowed()?;
        let options = self.settings.metadata_options();
        let built = entries
            .iter()
            .map(|entry| build_collection(entry, &options))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if self.settings.duplicate_collections == DuplicatePolicy::Fail {
            let mut seen: HashSet<&FullId> = HashSet::new();
            for collection in &built {
                let id = collection.full_id();
                if self.collections.contains_key(id) || !seen.insert(id) {
                    return Err(ContainerError::Metadata {
                        source: ModelError::DuplicateId { id: id.to_string() },
                    });
                }
            }
        }

        let mut report = MetadataReport::default();
        for collection in built {
            let id = collection.full_id().clone();
            match self.collections.get(&id) {
                None => {
                    self.registry.register_all(collection_ids(&collection))?;
                    self.collections.insert(id.clone(), collection);
                    report.added.push(id);
                }
                Some(existing) => match self.settings.duplicate_collections {
                    DuplicatePolicy::Skip | DuplicatePolicy::Fail => {
                        warn!(
                            collection = %id,
                            "error while parsing metadata: attempted to assign duplicate id {id}"
                        );
                        report.skipped.push(id);
                    }
                    DuplicatePolicy::Overwrite => {
                        warn!(collection = %id, "replacing previously loaded collection {id}");
                        let old_ids: Vec<FullId> = collection_ids(existing).cloned().collect();
                        self.registry.release_all(&old_ids);
                        self.registry.register_all(collection_ids(&collection))?;
                        self.collections.insert(id.clone(), collection);
                        report.replaced.push(id);
                    }
                },
            }
        }

        if !self.collections.is_empty() {
            self.state = ContainerState::MetadataLoaded;
        }
        info!(
            added = report.added.len(),
            replaced = report.replaced.len(),
            skipped = report.skipped.len(),
            registered_ids = self.registry.len(),
            "metadata loaded"
        );
        Ok(report)
    }

    /// Parses a YAML metadata document and registers its collections.
    ///
    /// Schema errors are prefixed with `origin`.
    pub fn load_metadata_yaml(&mut self, source: &str, origin: &str) -> Result<MetadataReport> {
        self.ensure_metadata_allowed()?;
        let entries = parse_metadata_document(source, origin)?;
        self.load_metadata_from(&entries, origin)
    }

    pub fn load_metadata_file(&mut self, path: &Path) -> Result<MetadataReport> {
        self.ensure_metadata_allowed()?;
        let entries = read_metadata_file(path)?;
        self.load_metadata_from(&entries, &path.display().to_string())
    }

    fn load_metadata_from(
        &mut self,
        entries: &[RawCollection],
        origin: &str,
    ) -> Result<MetadataReport> {
        self.load_metadata(entries)
            .map_err(|source| ContainerError::MetadataSource {
                origin: origin.to_string(),
                source: Box::new(source),
            })
    }

    /// Loads several metadata files in order. Stops at the first failing file.
    pub fn load_metadata_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<MetadataReport> {
        let mut report = MetadataReport::default();
        for path in paths {
            report.merge(self.load_metadata_file(path.as_ref())?);
        }
        Ok(report)
    }

    /// Loads survey responses given as rows, the first row being the header.
    pub fn load_survey_data<I, R, S>(
        &mut self,
        rows: I,
        data_source: &str,
    ) -> Result<IngestReport>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let table = CsvTable::from_rows(rows);
        self.load_survey_table(&table, data_source)
    }

    pub fn load_survey_file(&mut self, path: &Path) -> Result<IngestReport> {
        self.ensure_data_allowed()?;
        let table = read_csv_table(path)?;
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        self.load_survey_table(&table, &name)
    }

    /// Loads survey responses from a parsed table.
    ///
    /// The first column holds participant ids. Columns are matched to
    /// questions by full id; unmatched columns are ignored. All cells are
    /// resolved before anything is stored, so under the strict policy a
    /// failing cell leaves the container untouched.
    pub fn load_survey_table(
        &mut self,
        table: &CsvTable,
        data_source: &str,
    ) -> Result<IngestReport> {
        self.ensure_data_allowed()?;
        if table.headers.is_empty() {
            return Err(ContainerError::MissingHeader {
                data_source: data_source.to_string(),
            });
        }
        let lenient = self.settings.coercion == CoercionPolicy::Lenient;
        let mut report = IngestReport {
            data_source: data_source.to_string(),
            truncated_rows: table.truncated_rows.clone(),
            ..IngestReport::default()
        };

        let slots = self.match_columns(table, &mut report);
        let mut staged: Vec<(usize, usize, GivenAnswer)> = Vec::new();
        let mut participants: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for (index, row) in table.rows.iter().enumerate() {
            let line = index + 2;
            let participant = row.first().map_or("", |cell| cell.trim());
            if participant.is_empty() {
                let err = ContainerError::MissingParticipant {
                    data_source: data_source.to_string(),
                    row: line,
                };
                if !lenient {
                    return Err(err);
                }
                warn!(data_source, row = line, "skipping row without participant id");
                report.skipped_rows.push(SkippedRow {
                    row: line,
                    reason: err.to_string(),
                });
                continue;
            }
            if !seen.insert(participant) {
                let err = ContainerError::DuplicateParticipant {
                    data_source: data_source.to_string(),
                    participant: participant.to_string(),
                    row: line,
                };
                if !lenient {
                    return Err(err);
                }
                warn!(data_source, participant, row = line, "skipping repeated participant");
                report.skipped_rows.push(SkippedRow {
                    row: line,
                    reason: err.to_string(),
                });
                continue;
            }

            let participant_index = participants.len();
            participants.push(participant.to_string());
            for (slot_index, slot) in slots.iter().enumerate() {
                let raw = row.get(slot.column).map_or("", String::as_str);
                let question = self.slot_question(slot)?;
                match question.resolve_answer(participant, raw, &self.settings.tokens) {
                    Ok(answer) => staged.push((slot_index, participant_index, answer)),
                    Err(source) if lenient => {
                        warn!(
                            data_source,
                            participant,
                            question = %question.full_id(),
                            "skipping cell: {source}"
                        );
                        report.skipped_cells.push(SkippedCell {
                            participant: participant.to_string(),
                            question: question.full_id().clone(),
                            reason: source.to_string(),
                        });
                    }
                    Err(source) => {
                        return Err(ContainerError::Answer {
                            data_source: data_source.to_string(),
                            source,
                        });
                    }
                }
            }
        }

        report.participants = participants.len();
        report.answers = staged.len();
        for (slot_index, participant_index, answer) in staged {
            let participant = &participants[participant_index];
            self.slot_question_mut(&slots[slot_index])?
                .commit_answer(participant, answer)
                .map_err(|source| ContainerError::Answer {
                    data_source: data_source.to_string(),
                    source,
                })?;
        }

        self.participants = participants;
        self.data_source = Some(data_source.to_string());
        self.state = ContainerState::DataLoaded;
        info!(
            data_source,
            participants = report.participants,
            answers = report.answers,
            ignored_columns = report.ignored_columns.len(),
            skipped_cells = report.skipped_cells.len(),
            skipped_rows = report.skipped_rows.len(),
            truncated_rows = report.truncated_rows.len(),
            "survey data loaded"
        );
        Ok(report)
    }

    pub fn collection_for_id(&self, id: &str) -> Result<&QuestionCollection> {
        self.collections.get(id).ok_or_else(|| {
            ContainerError::Model(ModelError::UnknownId { id: id.to_string() })
        })
    }

    /// Resolves a full question id such as `Q001/SQ001`.
    pub fn question_for_id(&self, full_id: &str) -> Result<&Question> {
        let unknown = || {
            ContainerError::Model(ModelError::UnknownId {
                id: full_id.to_string(),
            })
        };
        let (collection, question) = full_id
            .split_once(self.settings.id_separator)
            .ok_or_else(unknown)?;
        self.collections
            .get(collection)
            .and_then(|collection| collection.question_for_id(question).ok())
            .ok_or_else(unknown)
    }

    /// Resolves a collection id or a full question id.
    pub fn node_for_id(&self, id: &str) -> Result<QuestionNode<'_>> {
        if let Some(collection) = self.collections.get(id) {
            return Ok(QuestionNode::Group(collection));
        }
        self.question_for_id(id).map(QuestionNode::Leaf)
    }

    /// One column per resolvable id; collection ids expand to their
    /// questions. Unknown ids are logged and left out.
    pub fn data_frame_for_ids(&self, ids: &[&str]) -> Result<DataFrame> {
        self.named_data_frame_for_ids(ids, ColumnNames::FullId)
    }

    pub fn named_data_frame_for_ids(&self, ids: &[&str], names: ColumnNames) -> Result<DataFrame> {
        let mut questions: IndexMap<&FullId, &Question> = IndexMap::new();
        for id in ids {
            match self.node_for_id(id) {
                Ok(node) => {
                    for question in node.flatten() {
                        questions.entry(question.full_id()).or_insert(question);
                    }
                }
                Err(err) => warn!(id, "skipping id in data frame request: {err}"),
            }
        }
        let questions: Vec<&Question> = questions.into_values().collect();
        Ok(named_answers_frame(&questions, names)?)
    }

    fn ensure_metadata_allowed(&self) -> Result<()> {
        if self.state == ContainerState::DataLoaded {
            return Err(ContainerError::InvalidState {
                operation: "load metadata",
                state: self.state,
            });
        }
        Ok(())
    }

    fn ensure_data_allowed(&self) -> Result<()> {
        if self.state != ContainerState::MetadataLoaded {
            return Err(ContainerError::InvalidState {
                operation: "load survey data",
                state: self.state,
            });
        }
        Ok(())
    }

    fn match_columns(&self, table: &CsvTable, report: &mut IngestReport) -> Vec<ColumnSlot> {
        let separator = self.settings.id_separator;
        let mut slots: Vec<ColumnSlot> = Vec::new();
        for (column, header) in table.headers.iter().enumerate().skip(1) {
            let slot = header.split_once(separator).and_then(|(collection, question)| {
                let (collection, _, entry) = self.collections.get_full(collection)?;
                let question = entry.question_for_id(question).ok()?.short_id().clone();
                Some(ColumnSlot {
                    column,
                    collection,
                    question,
                })
            });
            match slot {
                Some(slot)
                    if !slots.iter().any(|known| {
                        known.collection == slot.collection && known.question == slot.question
                    }) =>
                {
                    slots.push(slot);
                }
                Some(_) => {
                    warn!(column = header.as_str(), "ignoring repeated question column");
                    report.ignored_columns.push(header.clone());
                }
                None => {
                    debug!(column = header.as_str(), "ignoring column without matching question");
                    report.ignored_columns.push(header.clone());
                }
            }
        }
        report.matched_columns = slots.len();
        slots
    }

    fn slot_question(&self, slot: &ColumnSlot) -> Result<&Question> {
        let (_, collection) = self
            .collections
            .get_index(slot.collection)
            .ok_or_else(|| unknown_slot(slot))?;
        Ok(collection.question_for_id(slot.question.as_str())?)
    }

    fn slot_question_mut(&mut self, slot: &ColumnSlot) -> Result<&mut Question> {
        let (_, collection) = self
            .collections
            .get_index_mut(slot.collection)
            .ok_or_else(|| unknown_slot(slot))?;
        Ok(collection.question_for_id_mut(slot.question.as_str())?)
    }
}

fn unknown_slot(slot: &ColumnSlot) -> ModelError {
    ModelError::UnknownId {
        id: slot.question.to_string(),
    }
}

fn collection_ids(collection: &QuestionCollection) -> impl Iterator<Item = &FullId> {
    std::iter::once(collection.full_id()).chain(collection.questions().map(Identifiable::full_id))
}
