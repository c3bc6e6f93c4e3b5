use std::fmt::Display;

use anyhow::{anyhow, Context};
use firestore_grpc::tonic;
use firestore_grpc::v1::firestore_client::FirestoreClient as GrpcFirestoreClient;
use firestore_grpc::v1::{DeleteDocumentRequest, Document, DocumentMask, UpdateDocumentRequest};
use firestore_grpc::{
    tonic::{
        codegen::InterceptedService, metadata::MetadataValue, transport::Channel, Request, Status,
    },
    v1::GetDocumentRequest,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::auth::Auth;
use crate::error::FirebaseError;

use super::reference::DocumentReference;
use super::value::{from_document_fields, to_document_fields};

type InterceptorFunction = Box<dyn FnMut(Request<()>) -> Result<Request<()>, Status> + Send>;

/// A connected Firestore client. Obtain one with
/// [`Firestore::client`](super::Firestore::client).
pub struct FirestoreClient {
    client: GrpcFirestoreClient<InterceptedService<Channel, InterceptorFunction>>,
    root_resource_path: String,
}

/// Everything the interceptor needs to decorate outgoing requests.
pub(crate) struct RequestMetadata {
    pub(crate) api_key: Option<String>,
    pub(crate) resource_prefix: String,
    pub(crate) auth: Option<Auth>,
}

fn ascii_metadata(
    value: &str,
    what: &str,
) -> Result<MetadataValue<tonic::metadata::Ascii>, Status> {
    MetadataValue::from_str(value).map_err(|_| {
        Status::unauthenticated(format!("Failed to construct metadata value for {what}"))
    })
}

fn create_metadata_interceptor(metadata: RequestMetadata) -> InterceptorFunction {
    Box::new(move |mut req: Request<()>| {
        let prefix = ascii_metadata(&metadata.resource_prefix, "resource prefix")?;
        req.metadata_mut().insert("google-cloud-resource-prefix", prefix);

        if let Some(api_key) = &metadata.api_key {
            let mut header_value = ascii_metadata(api_key, "API key")?;
            header_value.set_sensitive(true);
            req.metadata_mut().insert("x-goog-api-key", header_value);
        }

        // Requests are made as the signed-in user, or unauthenticated.
        if let Some(token) = metadata.auth.as_ref().and_then(Auth::current_id_token) {
            let mut header_value =
                ascii_metadata(&format!("Bearer {token}"), "authorization token")?;
            header_value.set_sensitive(true);
            req.metadata_mut().insert("authorization", header_value);
        }

        Ok(req)
    })
}

fn not_found_as_none<T>(result: Result<T, Status>) -> Result<Option<T>, Status> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(status) if status.code() == tonic::Code::NotFound => Ok(None),
        Err(status) => Err(status),
    }
}

impl FirestoreClient {
    pub(crate) async fn connect(
        host_url: &str,
        root_resource_path: String,
        metadata: RequestMetadata,
    ) -> Result<Self, FirebaseError> {
        let channel = Channel::from_shared(host_url.to_string())
            .context("Failed to create gRPC channel")?
            .connect()
            .await
            .context("Failed to create channel to endpoint")?;

        let service =
            GrpcFirestoreClient::with_interceptor(channel, create_metadata_interceptor(metadata));

        Ok(Self {
            client: service,
            root_resource_path,
        })
    }

    /// Retrieves the document at the given reference, or `None` if it does
    /// not exist.
    #[tracing::instrument(name = "Get document", skip_all, fields(doc = %doc_ref))]
    pub async fn get_document<T: DeserializeOwned>(
        &mut self,
        doc_ref: &DocumentReference,
    ) -> Result<Option<T>, FirebaseError> {
        let request = GetDocumentRequest {
            name: self.get_name_with(doc_ref),
            mask: None,
            consistency_selector: None,
        };

        let response = self.client.get_document(request).await;
        let Some(doc) = not_found_as_none(response).map_err(|err| anyhow!(err))? else {
            return Ok(None);
        };

        let json = from_document_fields(doc.into_inner().fields, &self.root_resource_path);
        let deserialized = serde_json::from_value(json)
            .with_context(|| format!("Failed to deserialize document '{doc_ref}'"))?;

        Ok(Some(deserialized))
    }

    /// Writes the document at the given reference, creating it or replacing
    /// whatever was there.
    #[tracing::instrument(name = "Set document", skip_all, fields(doc = %doc_ref))]
    pub async fn set_document<T: Serialize>(
        &mut self,
        doc_ref: &DocumentReference,
        document: &T,
    ) -> Result<(), FirebaseError> {
        let json = serde_json::to_value(document)
            .with_context(|| format!("Failed to serialize document '{doc_ref}'"))?;

        let request = UpdateDocumentRequest {
            document: Some(Document {
                name: self.get_name_with(doc_ref),
                fields: to_document_fields(json)?,
                create_time: None,
                update_time: None,
            }),
            update_mask: None,
            mask: Some(DocumentMask {
                field_paths: vec![],
            }),
            current_document: None,
        };

        self.client
            .update_document(request)
            .await
            .map_err(|err| anyhow!(err))?;

        Ok(())
    }

    /// Deletes the document at the given reference. Deleting a document that
    /// does not exist succeeds.
    #[tracing::instrument(name = "Delete document", skip_all, fields(doc = %doc_ref))]
    pub async fn delete_document(
        &mut self,
        doc_ref: &DocumentReference,
    ) -> Result<(), FirebaseError> {
        let request = DeleteDocumentRequest {
            name: self.get_name_with(doc_ref),
            current_document: None,
        };

        self.client
            .delete_document(request)
            .await
            .map_err(|err| anyhow!(err))?;

        Ok(())
    }

    pub(crate) fn get_name_with(&self, item: impl Display) -> String {
        format!("{}/{}", self.root_resource_path, item)
    }
}
