use crate::SplitBitmask;
use log::{debug, warn};
use slotmap::{SlotMap, new_key_type};
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

new_key_type! { pub struct TaxonId; }

static NEXT_TAXON_OID: AtomicUsize = AtomicUsize::new(1);
static NEXT_REGISTRY_ID: AtomicUsize = AtomicUsize::new(1);

/// Program-assigned identity of a [TaxonRegistry].
///
/// Trees remember the id of the registry their [TaxonId] keys point into, so
/// a tree is never composed or collected against a foreign registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryId(usize);

impl RegistryId {
    fn next() -> Self {
        Self(NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for RegistryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TaxonRegistry{}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaxonError {
    #[error("Taxon not found: oid={oid:?}, label={label:?}.")]
    NotFound { oid: Option<String>, label: Option<String> },
    #[error("Taxon '{0}' cannot be added to a locked taxon registry.")]
    Locked(String),
    #[error("Taxon with TaxonId: {0:?} is not a member of this registry.")]
    NotMember(TaxonId),
    #[error("Taxon with label '{0}' is already defined in the registry.")]
    DuplicateLabel(String),
    #[error("Need to specify a taxon label or oid.")]
    MissingIdentity,
    #[error(
        "Taxon at index {0} does not fit into a {bits}-bit split bitmask.",
        bits = SplitBitmask::BITS
    )]
    BitmaskOverflow(usize),
    #[error("Tree refers to {found}, but {expected} was given.")]
    RegistryMismatch { expected: RegistryId, found: RegistryId },
}

/// A named leaf identity shared by every tree that refers to it.
///
/// Taxa are owned by a [TaxonRegistry] and are only ever referred to by
/// [TaxonId]; there is no way to obtain an independent copy.
#[derive(Debug, PartialEq)]
pub struct Taxon {
    oid: Arc<str>,
    label: Option<Arc<str>>,
    split_bitmask: Option<SplitBitmask>,
}

impl Taxon {
    fn new(label: Option<&str>, oid: Option<&str>) -> Self {
        let oid: Arc<str> = match oid {
            Some(oid) => oid.into(),
            None => {
                let n = NEXT_TAXON_OID.fetch_add(1, Ordering::Relaxed);
                format!("Taxon{n}").into()
            }
        };
        Self { oid, label: label.map(Into::into), split_bitmask: None }
    }

    pub fn oid(&self) -> &str {
        &self.oid
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The label, or the oid for a taxon created without one.
    pub fn display_label(&self) -> Arc<str> {
        self.label.clone().unwrap_or_else(|| self.oid.clone())
    }

    pub fn cached_split_bitmask(&self) -> Option<SplitBitmask> {
        self.split_bitmask
    }

    fn matches(&self, label: Option<&str>, oid: Option<&str>) -> bool {
        oid.is_some_and(|oid| &*self.oid == oid)
            || label.is_some_and(|label| self.label.as_deref() == Some(label))
    }
}

impl Display for Taxon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_label())
    }
}

/// Either side of the taxon coercion done by [resolve_or_create_taxon].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonRef<'a> {
    Label(&'a str),
    Identity(TaxonId),
}

impl<'a> From<&'a str> for TaxonRef<'a> {
    fn from(label: &'a str) -> Self {
        TaxonRef::Label(label)
    }
}

impl From<TaxonId> for TaxonRef<'_> {
    fn from(taxon_id: TaxonId) -> Self {
        TaxonRef::Identity(taxon_id)
    }
}

/// Ordered collection of unique taxa.
///
/// The position of a taxon in the registry is its bit position in every
/// split bitmask. Masks are computed lazily and cached on the taxon, so they
/// stay valid as long as taxa are only ever appended. Removing a taxon
/// shifts the positions of all later taxa and leaves their cached masks
/// stale.
#[derive(Debug)]
pub struct TaxonRegistry {
    id: RegistryId,
    label: Option<Arc<str>>,
    taxa: SlotMap<TaxonId, Taxon>,
    order: Vec<TaxonId>,
    locked: bool,
}

impl Default for TaxonRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaxonRegistry {
    pub fn new() -> Self {
        Self {
            id: RegistryId::next(),
            label: None,
            taxa: SlotMap::with_key(),
            order: Vec::new(),
            locked: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Creates a registry holding one new taxon per label, in the given order.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for label in labels {
            registry.push(Taxon::new(Some(label.as_ref()), None));
        }
        registry
    }

    /// Creates a registry of `ntax` taxa labelled `T1..Tn`, zero-padded to
    /// the width of `ntax` (`T01..T10` for ten taxa).
    pub fn generate(ntax: usize) -> Self {
        let width = ntax.to_string().len();
        Self::generate_with(ntax, |n| format!("T{n:0width$}"))
    }

    /// Creates a registry of `ntax` taxa labelled by `label_fn(1..=ntax)`.
    pub fn generate_with(ntax: usize, label_fn: impl Fn(usize) -> String) -> Self {
        Self::from_labels((1..=ntax).map(label_fn))
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn contains(&self, taxon_id: TaxonId) -> bool {
        self.taxa.contains_key(taxon_id)
    }

    pub fn taxon(&self, taxon_id: TaxonId) -> Option<&Taxon> {
        self.taxa.get(taxon_id)
    }

    /// Taxa in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (TaxonId, &Taxon)> {
        self.order.iter().map(|&taxon_id| (taxon_id, &self.taxa[taxon_id]))
    }

    pub fn taxon_ids(&self) -> &[TaxonId] {
        &self.order
    }

    pub fn index_of(&self, taxon_id: TaxonId) -> Result<usize, TaxonError> {
        self.order
            .iter()
            .position(|&id| id == taxon_id)
            .ok_or(TaxonError::NotMember(taxon_id))
    }

    /// Finds the first taxon whose oid or label matches.
    pub fn find(&self, label: Option<&str>, oid: Option<&str>) -> Option<TaxonId> {
        self.order
            .iter()
            .copied()
            .find(|&taxon_id| self.taxa[taxon_id].matches(label, oid))
    }

    /// Returns the taxon matching `oid` or `label`, appending a new one if
    /// there is none and the registry is not locked.
    pub fn find_or_create(
        &mut self,
        label: Option<&str>,
        oid: Option<&str>,
    ) -> Result<TaxonId, TaxonError> {
        if label.is_none() && oid.is_none() {
            return Err(TaxonError::MissingIdentity);
        }

        if let Some(taxon_id) = self.find(label, oid) {
            return Ok(taxon_id);
        }

        if self.locked {
            return Err(TaxonError::NotFound {
                oid: oid.map(str::to_string),
                label: label.map(str::to_string),
            });
        }

        Ok(self.push(Taxon::new(label, oid)))
    }

    /// Appends a new, distinct taxon even when one with the same label
    /// exists, unless `error_if_label_exists` is set.
    pub fn new_taxon(
        &mut self,
        label: Option<&str>,
        oid: Option<&str>,
        error_if_label_exists: bool,
    ) -> Result<TaxonId, TaxonError> {
        if self.locked {
            return Err(TaxonError::Locked(
                label.or(oid).unwrap_or_default().to_string(),
            ));
        }

        if error_if_label_exists
            && let Some(label) = label
            && self.find(Some(label), None).is_some()
        {
            return Err(TaxonError::DuplicateLabel(label.to_string()));
        }

        Ok(self.push(Taxon::new(label, oid)))
    }

    fn push(&mut self, taxon: Taxon) -> TaxonId {
        debug!("{}: new taxon '{}' at index {}", self.id, taxon, self.order.len());
        let taxon_id = self.taxa.insert(taxon);
        self.order.push(taxon_id);
        taxon_id
    }

    /// Removes a taxon. Every later taxon moves down one bit position, so any
    /// mask cached before the removal is no longer meaningful.
    pub fn remove(&mut self, taxon_id: TaxonId) -> Result<Taxon, TaxonError> {
        let index = self.index_of(taxon_id)?;
        self.warn_if_masks_cached("remove");
        _ = self.order.remove(index);
        self.taxa.remove(taxon_id).ok_or(TaxonError::NotMember(taxon_id))
    }

    /// Removes all taxa. Previously issued [TaxonId]s stop resolving.
    pub fn clear(&mut self) {
        self.warn_if_masks_cached("clear");
        self.taxa.clear();
        self.order.clear();
    }

    fn warn_if_masks_cached(&self, operation: &str) {
        let cached = self.taxa.values().filter(|t| t.split_bitmask.is_some()).count();
        if cached > 0 {
            warn!(
                "{}: {operation} invalidates {cached} cached split bitmask(s)",
                self.id
            );
        }
    }

    /// Labels in registry order; a taxon without a label contributes its oid.
    pub fn labels(&self) -> Vec<Arc<str>> {
        self.iter().map(|(_, taxon)| taxon.display_label()).collect()
    }

    /// Returns the cached bitmask of a taxon, computing and caching
    /// `1 << index` on first use.
    pub fn taxon_bitmask(&mut self, taxon_id: TaxonId) -> Result<SplitBitmask, TaxonError> {
        if let Some(mask) = self.cached_bitmask(taxon_id)? {
            return Ok(mask);
        }

        let mask = self.compute_bitmask(taxon_id)?;
        if let Some(taxon) = self.taxa.get_mut(taxon_id) {
            taxon.split_bitmask = Some(mask);
        }
        Ok(mask)
    }

    /// Same value as [TaxonRegistry::taxon_bitmask], without caching it.
    pub fn peek_bitmask(&self, taxon_id: TaxonId) -> Result<SplitBitmask, TaxonError> {
        match self.cached_bitmask(taxon_id)? {
            Some(mask) => Ok(mask),
            None => self.compute_bitmask(taxon_id),
        }
    }

    fn cached_bitmask(&self, taxon_id: TaxonId) -> Result<Option<SplitBitmask>, TaxonError> {
        self.taxa
            .get(taxon_id)
            .map(Taxon::cached_split_bitmask)
            .ok_or(TaxonError::NotMember(taxon_id))
    }

    fn compute_bitmask(&self, taxon_id: TaxonId) -> Result<SplitBitmask, TaxonError> {
        let index = self.index_of(taxon_id)?;
        if index >= SplitBitmask::BITS as usize {
            return Err(TaxonError::BitmaskOverflow(index));
        }
        Ok(1 << index)
    }

    pub fn all_taxa_bitmask(&self) -> SplitBitmask {
        match self.len() {
            n if n >= SplitBitmask::BITS as usize => SplitBitmask::MAX,
            n => (1 << n) - 1,
        }
    }

    pub fn complement(&self, split: SplitBitmask) -> SplitBitmask {
        !split & self.all_taxa_bitmask()
    }

    /// Bitstring of `split`, left-padded with zeros to the registry size.
    pub fn split_bitmask_string(&self, split: SplitBitmask) -> String {
        let width = self.len();
        format!("{split:0width$b}")
    }
}

impl Display for TaxonRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(label) = &self.label {
            write!(f, " ('{label}')")?;
        }
        let labels: Vec<String> = self.labels().iter().map(|l| l.to_string()).collect();
        write!(f, " : [{}]", labels.join(", "))
    }
}

/// Coerces a raw label or an existing identity into a taxon of `registry`.
///
/// Labels are looked up and created when missing (subject to the lock);
/// identities must already belong to the registry.
pub fn resolve_or_create_taxon(
    registry: &mut TaxonRegistry,
    value: TaxonRef<'_>,
) -> Result<TaxonId, TaxonError> {
    match value {
        TaxonRef::Label(label) => registry.find_or_create(Some(label), None),
        TaxonRef::Identity(taxon_id) if registry.contains(taxon_id) => Ok(taxon_id),
        TaxonRef::Identity(taxon_id) => Err(TaxonError::NotMember(taxon_id)),
    }
}
