// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Registration of sequence providers into a session.

use crate::catalog::Catalog;
use crate::config::SequenceConfig;
use crate::model::SchemaName;
use crate::provider::SequenceProvider;
use crate::session::Session;
use crate::{SequenceError, SequenceResult};
use log::info;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

/// A live session together with the sequence providers registered into it.
///
/// Providers are owned by the session that holds them and are dropped with it.  There is at most
/// one provider per generator name.
pub struct SequenceSession<S: Session> {
    /// The underlying database session.
    session: S,

    /// Schema applied to name resolution in `session`, if any.
    qualifier: Option<SchemaName>,

    /// Registered providers keyed by generator name.
    providers: BTreeMap<String, SequenceProvider>,
}

impl<S: Session> SequenceSession<S> {
    /// Wraps `session` without any registered provider.
    pub fn new(session: S) -> Self {
        Self { session, qualifier: None, providers: BTreeMap::default() }
    }

    /// Returns the schema applied to name resolution, if any.
    pub fn name_qualifier(&self) -> Option<&SchemaName> {
        self.qualifier.as_ref()
    }

    /// Scopes the resolution of table and sequence names in the session to `schema`.
    pub async fn set_name_qualifier(&mut self, schema: &SchemaName) -> SequenceResult<()> {
        info!("Setting name qualifier to schema {}", schema);
        self.session.set_name_qualifier(schema).await?;
        self.qualifier = Some(schema.clone());
        Ok(())
    }

    /// Registers `provider` under its generator name.
    ///
    /// Fails if a provider with the same name is already registered, leaving the existing one
    /// untouched.
    pub fn add_sequence(&mut self, provider: SequenceProvider) -> SequenceResult<()> {
        match self.providers.entry(provider.name().to_owned()) {
            Entry::Occupied(e) => Err(SequenceError::AlreadyRegistered(e.key().clone())),
            Entry::Vacant(e) => {
                provider.on_acquire_connection();
                e.insert(provider);
                Ok(())
            }
        }
    }

    /// Returns the provider registered under `name`, if any.
    pub fn sequence(&self, name: &str) -> Option<&SequenceProvider> {
        self.providers.get(name)
    }

    /// Returns the names of all registered providers in sorted order.
    pub fn sequence_names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Returns the provider registered under `name` or fails without touching the database.
    fn registered(&self, name: &str) -> SequenceResult<&SequenceProvider> {
        self.providers.get(name).ok_or_else(|| SequenceError::UnknownGenerator(name.to_owned()))
    }

    /// Fetches the next value of the generator `name`.
    pub async fn next_value(&mut self, name: &str) -> SequenceResult<i64> {
        let provider = self
            .providers
            .get(name)
            .ok_or_else(|| SequenceError::UnknownGenerator(name.to_owned()))?;
        provider.next_value(&mut self.session).await
    }

    /// Fetches `count` values of the generator `name` as an all-or-nothing batch.
    pub async fn next_values(&mut self, name: &str, count: usize) -> SequenceResult<Vec<i64>> {
        let provider = self
            .providers
            .get(name)
            .ok_or_else(|| SequenceError::UnknownGenerator(name.to_owned()))?;
        provider.next_values(&mut self.session, count).await
    }

    /// Returns the underlying session to run other statements on it.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Releases all providers, undoes the name qualifier if one was applied, and returns the
    /// underlying session ready to be handed to code that does not expect the qualifier.
    pub async fn release(mut self) -> SequenceResult<S> {
        if self.qualifier.take().is_some() {
            info!("Resetting name qualifier");
            self.session.reset_name_qualifier().await?;
        }
        Ok(self.into_inner())
    }

    /// Releases all providers and returns the underlying session as is.
    ///
    /// Any name qualifier stays applied to the session.  Use `release` instead if the session's
    /// connection goes back to a pool shared with other code.
    pub fn into_inner(self) -> S {
        for provider in self.providers.values() {
            provider.on_release_connection();
        }
        self.session
    }
}

/// Prepares `session` to serve identifiers for every generator in `catalog`.
///
/// This is meant to run exactly once per session, right after it is opened.  The configured schema,
/// if any, is applied before any provider is registered.  Returns the names of the registered
/// generators in catalog order.
///
/// Running this a second time on the same session fails with `AlreadyRegistered` and changes
/// nothing, so a session can never end up with two live providers for one name.
pub async fn customize<S: Session>(
    session: &mut SequenceSession<S>,
    catalog: &Arc<Catalog>,
    config: &SequenceConfig,
) -> SequenceResult<Vec<String>> {
    if let Some(name) = catalog.names().find(|name| session.registered(name).is_ok()) {
        return Err(SequenceError::AlreadyRegistered(name.to_owned()));
    }

    if let Some(schema) = config.schema() {
        session.set_name_qualifier(schema).await?;
    }

    let mut names = Vec::with_capacity(catalog.len());
    for name in catalog.names() {
        info!("Adding sequence: {}", name);
        session.add_sequence(SequenceProvider::new(name, catalog.clone(), config.dialect()))?;
        names.push(name.to_owned());
    }
    Ok(names)
}
