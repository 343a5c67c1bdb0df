use bson::{doc, Bson, Document};

use super::{
    require_collection, require_criteria, require_data, CommandError, CommandOptions, CommandResult,
    WriteOperation,
};

/// Numeric filter codes and the band letter they stand for.
const FID_TABLE: &[(i64, &str)] = &[
    (0, "u"),
    (1, "g"),
    (2, "r"),
    (3, "i"),
    (4, "z"),
    (5, "Y"),
    (12, "gr"),
];

/// Map a numeric filter code to its band letter.
///
/// Letters, nulls and codes missing from the table are returned unchanged.
pub fn normalize_fid(fid: &Bson) -> Bson {
    let code = match fid {
        Bson::Int32(c) => i64::from(*c),
        Bson::Int64(c) => *c,
        Bson::Double(c) if c.fract() == 0.0 => *c as i64,
        other => return other.clone(),
    };
    FID_TABLE
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, band)| Bson::String((*band).to_string()))
        .unwrap_or_else(|| fid.clone())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub name: String,
    pub value: Bson,
    pub fid: Bson,
}

impl Feature {
    pub fn to_document(&self) -> Document {
        doc! {
            "name": self.name.as_str(),
            "value": self.value.clone(),
            "fid": self.fid.clone(),
        }
    }
}

/// A complete snapshot of one feature group.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureGroupRecord {
    pub group: String,
    pub version: String,
    pub features: Vec<Feature>,
}

impl FeatureGroupRecord {
    /// The subtree stored at `features.<group>`.
    pub fn to_document(&self) -> Document {
        let features: Vec<Document> = self.features.iter().map(Feature::to_document).collect();
        doc! {
            "version": self.version.as_str(),
            "features": features,
        }
    }
}

/// Replaces one feature group of the document matched by `criteria`.
///
/// The group is always written with `$set`, so a new snapshot overwrites the
/// previous one wholesale while other groups stay untouched. `set_on_insert`
/// is accepted but has no effect here.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFeaturesCommand {
    collection: String,
    data: Document,
    criteria: Document,
    options: CommandOptions,
    record: FeatureGroupRecord,
}

impl UpdateFeaturesCommand {
    pub fn new(
        collection: Option<String>,
        data: Option<Document>,
        criteria: Option<Document>,
        options: CommandOptions,
    ) -> CommandResult<Self> {
        let collection = require_collection(collection)?;
        let data = require_data(data)?;
        let criteria = require_criteria(criteria)?;
        let record = parse_feature_group(&data)?;
        Ok(Self { collection, data, criteria, options, record })
    }

    pub fn collection(&self) -> &str { &self.collection }
    pub fn data(&self) -> &Document { &self.data }
    pub fn criteria(&self) -> &Document { &self.criteria }
    pub fn options(&self) -> CommandOptions { self.options }
    pub fn record(&self) -> &FeatureGroupRecord { &self.record }

    pub fn get_operations(&self) -> Vec<WriteOperation> {
        let mut fields = Document::new();
        fields.insert(format!("features.{}", self.record.group), self.record.to_document());
        vec![WriteOperation::update(
            self.criteria.clone(),
            doc! { "$set": fields },
            self.options.upsert,
        )]
    }
}

fn parse_feature_group(data: &Document) -> CommandResult<FeatureGroupRecord> {
    let version = data
        .get_str("features_version")
        .map_err(|_| CommandError::NoFeatureVersionProvided)?
        .to_string();

    let raw_features = match data.get_array("features") {
        Ok(features) if !features.is_empty() => features,
        _ => return Err(CommandError::NoFeatureProvided),
    };

    let group = match data.get_str("features_group") {
        // dots or a leading '$' would address a different path
        Ok(g) if !g.is_empty() && !g.contains('.') && !g.starts_with('$') => g.to_string(),
        _ => return Err(CommandError::NoFeatureGroupProvided),
    };

    let mut features = Vec::with_capacity(raw_features.len());
    for (index, raw) in raw_features.iter().enumerate() {
        let raw = raw.as_document().ok_or(CommandError::MalformedFeature { index })?;
        let name = raw
            .get_str("name")
            .map_err(|_| CommandError::MalformedFeature { index })?
            .to_string();
        features.push(Feature {
            name,
            value: raw.get("value").cloned().unwrap_or(Bson::Null),
            fid: normalize_fid(raw.get("fid").unwrap_or(&Bson::Null)),
        });
    }

    Ok(FeatureGroupRecord { group, version, features })
}
