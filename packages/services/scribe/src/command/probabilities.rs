use std::cmp::Ordering;

use bson::{doc, Bson, Document};

use super::{
    require_collection, require_criteria, require_data, CommandError, CommandOptions, CommandResult,
    WriteOperation,
};

const CLASSIFIER_NAME: &str = "classifier_name";
const CLASSIFIER_VERSION: &str = "classifier_version";

/// One entry of a document's `probabilities` array.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityRecord {
    pub classifier_name: String,
    pub classifier_version: String,
    pub class_name: String,
    pub probability: f64,
    pub ranking: i32,
}

impl ProbabilityRecord {
    pub fn to_document(&self) -> Document {
        doc! {
            "classifier_name": self.classifier_name.as_str(),
            "classifier_version": self.classifier_version.as_str(),
            "class_name": self.class_name.as_str(),
            "probability": self.probability,
            "ranking": self.ranking,
        }
    }

    /// Array filter selecting stored entries for the same classifier and class.
    fn element_filter(&self) -> Document {
        doc! {
            "el.classifier_name": self.classifier_name.as_str(),
            "el.classifier_version": self.classifier_version.as_str(),
            "el.class_name": self.class_name.as_str(),
        }
    }
}

/// Appends one classifier's output to the `probabilities` array of the
/// document matched by `criteria`.
///
/// `data` holds `classifier_name`, `classifier_version` and one
/// `class_name: probability` pair per class.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateProbabilitiesCommand {
    collection: String,
    data: Document,
    criteria: Document,
    options: CommandOptions,
    records: Vec<ProbabilityRecord>,
}

impl UpdateProbabilitiesCommand {
    pub fn new(
        collection: Option<String>,
        data: Option<Document>,
        criteria: Option<Document>,
        options: CommandOptions,
    ) -> CommandResult<Self> {
        let collection = require_collection(collection)?;
        let data = require_data(data)?;
        let criteria = require_criteria(criteria)?;
        let records = rank_probabilities(&data)?;
        Ok(Self { collection, data, criteria, options, records })
    }

    pub fn collection(&self) -> &str { &self.collection }
    pub fn data(&self) -> &Document { &self.data }
    pub fn criteria(&self) -> &Document { &self.criteria }
    pub fn options(&self) -> CommandOptions { self.options }

    /// Ranked records, best class first.
    pub fn records(&self) -> &[ProbabilityRecord] { &self.records }

    pub fn get_operations(&self) -> Vec<WriteOperation> {
        let mut operations = Vec::with_capacity(2 + self.records.len());

        // Only effective when the update creates the document.
        operations.push(WriteOperation::update(
            self.criteria.clone(),
            doc! { "$setOnInsert": { "probabilities": [] } },
            self.options.upsert,
        ));

        let pushed: Vec<Document> = self.records.iter().map(ProbabilityRecord::to_document).collect();
        operations.push(WriteOperation::update(
            self.criteria.clone(),
            doc! { "$push": { "probabilities": { "$each": pushed } } },
            false,
        ));

        if !self.options.set_on_insert {
            for record in &self.records {
                operations.push(WriteOperation::update_with_array_filters(
                    self.criteria.clone(),
                    doc! {
                        "$set": {
                            "probabilities.$[el].probability": record.probability,
                            "probabilities.$[el].ranking": record.ranking,
                        }
                    },
                    false,
                    vec![record.element_filter()],
                ));
            }
        }

        operations
    }
}

/// Rank the classes of `data` by descending probability.
///
/// Ties keep the order in which the classes appear in `data`.
fn rank_probabilities(data: &Document) -> CommandResult<Vec<ProbabilityRecord>> {
    let classifier_name = required_str(data, CLASSIFIER_NAME)?;
    let classifier_version = required_str(data, CLASSIFIER_VERSION)?;

    let mut classes: Vec<(String, f64)> = Vec::new();
    for (class_name, value) in data {
        if class_name == CLASSIFIER_NAME || class_name == CLASSIFIER_VERSION {
            continue;
        }
        let probability = match value {
            Bson::Double(p) => *p,
            Bson::Int32(p) => f64::from(*p),
            Bson::Int64(p) => *p as f64,
            _ => return Err(CommandError::InvalidProbability { class_name: class_name.clone() }),
        };
        if !(0.0..=1.0).contains(&probability) {
            return Err(CommandError::InvalidProbability { class_name: class_name.clone() });
        }
        classes.push((class_name.clone(), probability));
    }

    if classes.is_empty() {
        return Err(CommandError::NoProbabilitiesProvided);
    }

    // stable: equal probabilities stay in payload order
    classes.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    Ok(classes
        .into_iter()
        .enumerate()
        .map(|(i, (class_name, probability))| ProbabilityRecord {
            classifier_name: classifier_name.clone(),
            classifier_version: classifier_version.clone(),
            class_name,
            probability,
            ranking: i as i32 + 1,
        })
        .collect())
}

fn required_str(data: &Document, field: &'static str) -> CommandResult<String> {
    data.get_str(field)
        .map(str::to_string)
        .map_err(|_| CommandError::NoClassifierProvided { field })
}
