use super::*;

impl RequestPipeline {
    /// Pushes a freshly inserted child onto its parent's children list.
    ///
    /// When the parent cannot be saved the child is deleted again on a best
    /// effort basis and the request fails with an internal error; the caller
    /// should re-query before retrying.
    pub async fn attach_child(
        &self,
        child_model: &ModelDescriptor,
        child: &Document,
        parent: Document,
    ) -> AppResult<Document> {
        let Some(link) = child_model.parent else {
            return Ok(parent);
        };
        let child_id = child.id().unwrap_or_default().to_owned();
        let parent_id = parent.id().unwrap_or_default();

        match self
            .store
            .add_to_set(
                link.model.collection,
                parent_id,
                link.children_field,
                Value::String(child_id.clone()),
            )
            .await
        {
            Ok(parent) => Ok(parent),
            Err(error) => {
                warn!(
                    model = child_model.name,
                    child = %child_id,
                    %error,
                    "parent update failed, deleting the new child"
                );
                if let Err(cleanup_error) = self
                    .store
                    .delete_one(child_model.collection, &Filter::eq("_id", child_id.as_str()))
                    .await
                {
                    warn!(
                        model = child_model.name,
                        child = %child_id,
                        error = %cleanup_error,
                        "compensating delete failed, child may be orphaned"
                    );
                }

                Err(AppError::Internal(format!(
                    "failed to attach {} '{child_id}' to its {}: {error}",
                    child_model.name, link.model.name
                )))
            }
        }
    }

    /// Pulls a deleted child from its parent's children list.
    pub async fn detach_child(&self, child_model: &ModelDescriptor, child: &Document) -> AppResult<()> {
        let Some(link) = child_model.parent else {
            return Ok(());
        };
        let (Some(owner), Some(child_id)) = (
            child.get(link.foreign_key).and_then(Value::as_str),
            child.id(),
        ) else {
            return Ok(());
        };

        let modified = self
            .store
            .pull(
                link.model.collection,
                owner,
                link.children_field,
                Value::String(child_id.to_owned()),
            )
            .await?;
        if modified == 0 {
            warn!(
                model = child_model.name,
                child = child_id,
                owner,
                "owner of deleted child no longer exists"
            );
        }

        Ok(())
    }

    /// Saves the fields `updated` changed relative to `original`, leaving
    /// everything else (children lists included) as currently stored.
    pub async fn save_changes(
        &self,
        model: &ModelDescriptor,
        original: &Document,
        updated: &Document,
    ) -> AppResult<Document> {
        let id = original.id().ok_or_else(|| {
            AppError::Internal(format!("{} document is missing its _id", model.name))
        })?;
        let (changes, unset) = updated.changes_from(original);

        self.store
            .update_fields(model.collection, id, changes, &unset)
            .await
    }

    /// Deletes every child of `child_model` owned by `parent_id`.
    pub async fn delete_children(
        &self,
        child_model: &ModelDescriptor,
        parent_id: &str,
    ) -> AppResult<u64> {
        let Some(link) = child_model.parent else {
            return Ok(0);
        };

        self.store
            .delete_many(child_model.collection, &Filter::eq(link.foreign_key, parent_id))
            .await
    }

    /// Returns every child of `child_model` owned by `parent_id`.
    pub async fn find_children(
        &self,
        child_model: &ModelDescriptor,
        parent_id: &str,
    ) -> AppResult<Vec<Document>> {
        let Some(link) = child_model.parent else {
            return Ok(Vec::new());
        };

        self.store
            .find(
                child_model.collection,
                &Filter::eq(link.foreign_key, parent_id),
                &FindOptions::first(usize::MAX),
            )
            .await
    }

    /// Fetches documents by id, returned in the order of `ids`.
    pub async fn find_by_ids(
        &self,
        collection: Collection,
        ids: &[String],
    ) -> AppResult<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = self
            .store
            .find(
                collection,
                &Filter::In {
                    field: "_id".to_owned(),
                    values: ids.iter().cloned().map(Value::String).collect(),
                },
                &FindOptions::first(ids.len()),
            )
            .await?;

        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|document| document.id() == Some(id.as_str())))
            .cloned()
            .collect())
    }
}
