//! The identity resolver.
//!
//! Given an email and/or phone number, [`identify`] finds every contact
//! connected to it, settles which one is the primary, records whatever the
//! request adds, and collapses the group's linkage so that every other member
//! points straight at the primary.
//!
//! The resolver only talks to a [`ContactStore`]; atomicity comes from the
//! caller running it inside one unit of work.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, instrument};

use crate::{
  Error, Result,
  contact::{Contact, ContactId, LinkUpdate, NewContact},
  identity::{ConsolidatedIdentity, Identifiers},
  store::ContactStore,
};

/// Reconcile `identifiers` against `store` and return the consolidated view.
///
/// Creates at most one contact and may rewrite the linkage of any number of
/// group members. Never deletes.
#[instrument(level = "debug", skip_all)]
pub fn identify<S: ContactStore>(
  store: &mut S,
  identifiers: &Identifiers,
) -> Result<ConsolidatedIdentity> {
  let seeds = store
    .find_by_exact_match(identifiers.email(), identifiers.phone_number())
    .map_err(Error::store)?;

  let Some(first_seed) = seeds.first().map(|c| c.id) else {
    let (email, phone_number) = identifiers.clone().into_parts();
    let contact = store
      .create(NewContact::primary(email, phone_number))
      .map_err(Error::store)?;
    debug!(contact_id = %contact.id, "created primary contact");
    return Ok(ConsolidatedIdentity::single(&contact));
  };

  let mut group = expand_group(store, &seeds)?;
  let primary = oldest_member(store, &group)?
    .ok_or(Error::InternalConsistency(first_seed))?;

  if identifiers.is_new_to(&seeds) {
    let (email, phone_number) = identifiers.clone().into_parts();
    let created = store
      .create(NewContact::secondary(email, phone_number, primary.id))
      .map_err(Error::store)?;
    debug!(
      contact_id = %created.id,
      primary_id = %primary.id,
      "created secondary contact"
    );
    group.insert(created.id);
  }

  let secondary_ids = normalize_links(store, &group, primary.id)?;

  let members = store.find_by_ids(&group).map_err(Error::store)?;
  let primary = members
    .iter()
    .find(|c| c.id == primary.id)
    .ok_or(Error::InternalConsistency(primary.id))?;

  debug!(
    primary_id = %primary.id,
    members = members.len(),
    "resolved identity group"
  );
  Ok(ConsolidatedIdentity::assemble(primary, &members, secondary_ids))
}

/// Breadth-first closure of `seeds` over `linked_id` edges in both
/// directions. Each id is expanded at most once, so cyclic linkage cannot
/// loop.
fn expand_group<S: ContactStore>(
  store: &mut S,
  seeds: &[Contact],
) -> Result<BTreeSet<ContactId>> {
  let mut visited = BTreeSet::new();
  let mut queue = VecDeque::new();

  for seed in seeds {
    if visited.insert(seed.id) {
      queue.push_back(seed.clone());
    }
  }

  while let Some(contact) = queue.pop_front() {
    for child in store.find_by_linked_id(contact.id).map_err(Error::store)? {
      if visited.insert(child.id) {
        queue.push_back(child);
      }
    }

    if let Some(parent_id) = contact.linked_id
      && !visited.contains(&parent_id)
      && let Some(parent) = store.find_by_id(parent_id).map_err(Error::store)?
    {
      visited.insert(parent.id);
      queue.push_back(parent);
    }
  }

  Ok(visited)
}

/// The live member with the earliest `created_at`; ties go to the lowest id.
fn oldest_member<S: ContactStore>(
  store: &mut S,
  group: &BTreeSet<ContactId>,
) -> Result<Option<Contact>> {
  let members = store.find_by_ids(group).map_err(Error::store)?;
  Ok(members.into_iter().min_by_key(Contact::age_key))
}

/// Point every member other than `primary_id` directly at it, and make sure
/// `primary_id` itself carries primary precedence with no link.
///
/// Returns the secondary ids, oldest first.
fn normalize_links<S: ContactStore>(
  store: &mut S,
  group: &BTreeSet<ContactId>,
  primary_id: ContactId,
) -> Result<Vec<ContactId>> {
  let members = store.find_by_ids(group).map_err(Error::store)?;
  let mut secondary_ids = Vec::with_capacity(members.len().saturating_sub(1));

  for member in &members {
    if member.id == primary_id {
      if !member.is_primary() || member.linked_id.is_some() {
        store
          .update(member.id, LinkUpdate::promote())
          .map_err(Error::store)?;
        debug!(contact_id = %member.id, "promoted contact to primary");
      }
      continue;
    }

    if member.is_primary() {
      store
        .update(member.id, LinkUpdate::demote_to(primary_id))
        .map_err(Error::store)?;
      debug!(
        contact_id = %member.id,
        primary_id = %primary_id,
        "demoted primary contact"
      );
    } else if member.linked_id != Some(primary_id) {
      store
        .update(member.id, LinkUpdate::demote_to(primary_id))
        .map_err(Error::store)?;
      debug!(
        contact_id = %member.id,
        primary_id = %primary_id,
        "flattened secondary linkage"
      );
    }
    secondary_ids.push(member.id);
  }

  Ok(secondary_ids)
}
