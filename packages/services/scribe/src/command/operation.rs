use bson::Document;

/// A single primitive write, ready to be handed to a sink.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    InsertOne {
        document: Document,
    },
    UpdateOne {
        filter: Document,
        update: Document,
        upsert: bool,
        array_filters: Option<Vec<Document>>,
    },
}

impl WriteOperation {
    pub fn insert(document: Document) -> Self {
        Self::InsertOne { document }
    }

    pub fn update(filter: Document, update: Document, upsert: bool) -> Self {
        Self::UpdateOne { filter, update, upsert, array_filters: None }
    }

    pub fn update_with_array_filters(
        filter: Document,
        update: Document,
        upsert: bool,
        array_filters: Vec<Document>,
    ) -> Self {
        Self::UpdateOne { filter, update, upsert, array_filters: Some(array_filters) }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsertOne { .. } => "insert_one",
            Self::UpdateOne { .. } => "update_one",
        }
    }

    pub fn is_upsert(&self) -> bool {
        matches!(self, Self::UpdateOne { upsert: true, .. })
    }
}

impl std::fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsertOne { document } => write!(f, "InsertOne({})", document),
            Self::UpdateOne { filter, update, upsert, array_filters } => {
                write!(f, "UpdateOne(filter={}, update={}, upsert={}", filter, update, upsert)?;
                if let Some(filters) = array_filters {
                    let rendered: Vec<String> = filters.iter().map(|d| d.to_string()).collect();
                    write!(f, ", array_filters=[{}]", rendered.join(", "))?;
                }
                write!(f, ")")
            }
        }
    }
}
