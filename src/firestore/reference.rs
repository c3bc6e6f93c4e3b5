use std::sync::Arc;

use anyhow::anyhow;

use crate::error::FirebaseError;

pub fn collection(name: impl Into<String>) -> CollectionReference {
    CollectionReference::new(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReference(Arc<DocumentReferenceInner>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReference(Arc<CollectionReferenceInner>);

#[derive(Debug, Clone, PartialEq, Eq)]
struct CollectionReferenceInner {
    parent: Option<DocumentReference>,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DocumentReferenceInner {
    parent: CollectionReference,
    id: String,
}

impl CollectionReference {
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self(Arc::new(CollectionReferenceInner {
            parent: None,
            name: collection_name.into(),
        }))
    }

    pub fn doc(&self, id: impl Into<String>) -> DocumentReference {
        DocumentReference(Arc::new(DocumentReferenceInner {
            parent: self.clone(),
            id: id.into(),
        }))
    }

    pub fn parent(&self) -> Option<DocumentReference> {
        self.0.parent.clone()
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }
}

impl DocumentReference {
    pub fn collection(&self, name: impl Into<String>) -> CollectionReference {
        CollectionReference(Arc::new(CollectionReferenceInner {
            parent: Some(self.clone()),
            name: name.into(),
        }))
    }

    pub fn parent(&self) -> CollectionReference {
        self.0.parent.clone()
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }
}

/// Splits a slash-separated path into segments. Leading and trailing slashes
/// are ignored, empty segments in between are not allowed.
fn segments(path: &str) -> Result<Vec<&str>, FirebaseError> {
    let trimmed = path.trim_matches('/');
    let segments: Vec<&str> = trimmed.split('/').collect();

    if trimmed.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(anyhow!("Invalid path '{path}'").into());
    }

    Ok(segments)
}

impl TryFrom<&str> for CollectionReference {
    type Error = FirebaseError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        let segments = segments(path)?;
        if segments.len() % 2 == 0 {
            return Err(anyhow!(
                "Invalid collection path '{path}': it must have an odd number of segments"
            )
            .into());
        }

        let (first, rest) = segments
            .split_first()
            .ok_or_else(|| anyhow!("Invalid collection path '{path}'"))?;

        let mut collection = CollectionReference::new(*first);
        for pair in rest.chunks(2) {
            collection = collection.doc(pair[0]).collection(pair[1]);
        }

        Ok(collection)
    }
}

impl TryFrom<&str> for DocumentReference {
    type Error = FirebaseError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        let segments = segments(path)?;
        match segments.split_last() {
            Some((id, parent)) if segments.len() % 2 == 0 => {
                let collection = CollectionReference::try_from(parent.join("/").as_str())?;
                Ok(collection.doc(*id))
            }
            _ => Err(anyhow!(
                "Invalid document path '{path}': it must have an even number of segments"
            )
            .into()),
        }
    }
}

impl std::fmt::Display for CollectionReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0.parent {
            Some(doc) => write!(f, "{}/{}", doc, self.0.name),
            None => write!(f, "{}", self.0.name),
        }
    }
}

impl std::fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0.parent, self.0.id)
    }
}
