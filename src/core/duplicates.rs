//! Duplicate detection over the client table.
//!
//! Every strategy is read-only and recomputed on each call. Two notions of a
//! missing value coexist on purpose and must not be merged:
//!
//! * the strict strategies ([`single_field`], [`email_and_phone_report`],
//!   [`full_tuple_report`]) skip NULL **and** empty strings;
//! * the loose ones ([`combined_report`], [`field_membership_report`]) skip
//!   NULL only, so `""` can form a duplicate group.
//!
//! [`single_field`]: DuplicateDetector::single_field
//! [`email_and_phone_report`]: DuplicateDetector::email_and_phone_report
//! [`full_tuple_report`]: DuplicateDetector::full_tuple_report
//! [`combined_report`]: DuplicateDetector::combined_report
//! [`field_membership_report`]: DuplicateDetector::field_membership_report

use crate::domain::model::{ClientRecord, DuplicateGroup, Field};
use crate::domain::ports::RecordStore;
use crate::domain::query::{
    Filter, GroupCount, GroupOrder, GroupQuery, Presence, RecordOrder, RecordQuery,
};
use crate::utils::error::Result;
use serde::Serialize;

/// Company name, phone and email, in grouping order.
pub const TUPLE_FIELDS: [Field; 3] = [Field::CompanyName, Field::Phone, Field::Email];

/// Duplicate groups found on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDuplicates {
    pub field: Field,
    pub groups: Vec<DuplicateGroup>,
}

impl FieldDuplicates {
    /// Records involved in a duplicate, summed over the groups.
    pub fn total_records(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::count).sum()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn to_report_groups(&self) -> Vec<FieldGroupReport> {
        self.groups
            .iter()
            .map(|group| FieldGroupReport {
                criteria: self.field,
                value: group.key.first().cloned().unwrap_or_default(),
                count: group.count(),
                clients: group.members.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldGroupReport {
    pub criteria: Field,
    pub value: String,
    pub count: usize,
    pub clients: Vec<ClientRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateSummary {
    pub total_duplicate_groups: usize,
    pub total_email_duplicates: usize,
    pub total_phone_duplicates: usize,
    pub total_overall_duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicatesByField {
    pub by_email: Vec<FieldGroupReport>,
    pub by_phone: Vec<FieldGroupReport>,
}

/// Email and phone duplicates side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateReport {
    pub summary: DuplicateSummary,
    pub duplicates: DuplicatesByField,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TupleGroupReport {
    pub nom_entreprise: String,
    pub telephone: String,
    pub courriel: String,
    pub nombre_doublons: usize,
    pub clients: Vec<ClientRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullTupleSummary {
    pub nombre_groupes_doublons: usize,
    pub total_doublons: usize,
    pub moyenne_doublons_par_groupe: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullTupleReport {
    pub resume: FullTupleSummary,
    pub doublons: Vec<TupleGroupReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicatedTuple {
    pub nom_entreprise: String,
    pub telephone: String,
    pub courriel: String,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedReport {
    pub total_groupes_doublons: usize,
    pub total_clients: usize,
    pub groupes: Vec<DuplicatedTuple>,
    pub clients: Vec<ClientRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PerField<T> {
    pub nom_entreprise: T,
    pub telephone: T,
    pub courriel: T,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMembershipReport {
    pub doublons: PerField<Vec<ClientRecord>>,
    pub counts: PerField<usize>,
}

/// Mean group size rounded half away from zero to two decimals; 0 without groups.
///
/// Worked in integer hundredths so that halves are never lost to binary floats.
pub fn average_group_size(total: usize, groups: usize) -> f64 {
    if groups == 0 {
        return 0.0;
    }
    let (total, groups) = (total as u128, groups as u128);
    let hundredths = (total * 200 + groups) / (groups * 2);
    hundredths as f64 / 100.0
}

fn tuple_key(key: &[String]) -> (String, String, String) {
    let part = |i: usize| key.get(i).cloned().unwrap_or_default();
    (part(0), part(1), part(2))
}

pub struct DuplicateDetector<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> DuplicateDetector<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Groups of two or more records sharing `fields`, members loaded.
    ///
    /// Groups come back largest first, equal sizes by key; members by id.
    pub fn groups(&self, fields: &[Field], presence: Presence) -> Result<Vec<DuplicateGroup>> {
        let counts = self
            .store
            .group_counts(&GroupQuery::duplicates_of(fields, presence))?;

        let mut groups = Vec::with_capacity(counts.len());
        for GroupCount { key, .. } in counts {
            let members = self.store.fetch(
                &RecordQuery::new()
                    .filters(Filter::equals_key(fields, &key))
                    .order_by(RecordOrder::Id),
            )?;

            // The table may have moved between the two queries
            if members.len() > 1 {
                groups.push(DuplicateGroup {
                    criteria: fields.to_vec(),
                    key,
                    members,
                });
            }
        }

        groups.sort_by(|a, b| b.count().cmp(&a.count()).then_with(|| a.key.cmp(&b.key)));
        Ok(groups)
    }

    /// Non-null, non-empty values of `field` held by more than one record.
    pub fn single_field(&self, field: Field) -> Result<FieldDuplicates> {
        let groups = self.groups(&[field], Presence::NotBlank)?;
        tracing::debug!("{} duplicate groups on {}", groups.len(), field);
        Ok(FieldDuplicates { field, groups })
    }

    pub fn email_and_phone_report(&self) -> Result<DuplicateReport> {
        let email = self.single_field(Field::Email)?;
        let phone = self.single_field(Field::Phone)?;

        let summary = DuplicateSummary {
            total_duplicate_groups: email.group_count() + phone.group_count(),
            total_email_duplicates: email.total_records(),
            total_phone_duplicates: phone.total_records(),
            total_overall_duplicates: email.total_records() + phone.total_records(),
        };

        Ok(DuplicateReport {
            summary,
            duplicates: DuplicatesByField {
                by_email: email.to_report_groups(),
                by_phone: phone.to_report_groups(),
            },
        })
    }

    /// Records identical on company name, phone and email, none of them blank.
    pub fn full_tuple_report(&self) -> Result<FullTupleReport> {
        let groups = self.groups(&TUPLE_FIELDS, Presence::NotBlank)?;
        let total: usize = groups.iter().map(DuplicateGroup::count).sum();

        let resume = FullTupleSummary {
            nombre_groupes_doublons: groups.len(),
            total_doublons: total,
            moyenne_doublons_par_groupe: average_group_size(total, groups.len()),
        };

        let doublons = groups
            .into_iter()
            .map(|group| {
                let count = group.count();
                let (nom_entreprise, telephone, courriel) = tuple_key(&group.key);
                TupleGroupReport {
                    nom_entreprise,
                    telephone,
                    courriel,
                    nombre_doublons: count,
                    clients: group.members,
                }
            })
            .collect();

        Ok(FullTupleReport { resume, doublons })
    }

    /// Duplicated (company name, phone, email) tuples and every record in
    /// them, ordered by company name. Only NULL disqualifies a record.
    pub fn combined_report(&self) -> Result<CombinedReport> {
        let counts = self.store.group_counts(
            &GroupQuery::duplicates_of(&TUPLE_FIELDS, Presence::NotNull).order_by(GroupOrder::Key),
        )?;

        let clients = if counts.is_empty() {
            Vec::new()
        } else {
            let keys = counts.iter().map(|c| c.key.clone()).collect();
            self.store.fetch(
                &RecordQuery::new()
                    .filter(Filter::KeyIn {
                        fields: TUPLE_FIELDS.to_vec(),
                        keys,
                    })
                    .order_by(RecordOrder::FieldThenId(Field::CompanyName)),
            )?
        };

        let groupes: Vec<DuplicatedTuple> = counts
            .into_iter()
            .map(|GroupCount { key, count }| {
                let (nom_entreprise, telephone, courriel) = tuple_key(&key);
                DuplicatedTuple {
                    nom_entreprise,
                    telephone,
                    courriel,
                    total: count,
                }
            })
            .collect();

        Ok(CombinedReport {
            total_groupes_doublons: groupes.len(),
            total_clients: clients.len(),
            groupes,
            clients,
        })
    }

    /// Records whose value on `field` (NULL excluded) occurs more than once.
    pub fn members_of_duplicated_values(&self, field: Field) -> Result<Vec<ClientRecord>> {
        let keys: Vec<Vec<String>> = self
            .store
            .group_counts(
                &GroupQuery::duplicates_of(&[field], Presence::NotNull).order_by(GroupOrder::Key),
            )?
            .into_iter()
            .map(|c| c.key)
            .collect();

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        self.store.fetch(
            &RecordQuery::new()
                .filter(Filter::KeyIn {
                    fields: vec![field],
                    keys,
                })
                .order_by(RecordOrder::Id),
        )
    }

    /// Company name, phone and email examined one at a time.
    pub fn field_membership_report(&self) -> Result<FieldMembershipReport> {
        let doublons = PerField {
            nom_entreprise: self.members_of_duplicated_values(Field::CompanyName)?,
            telephone: self.members_of_duplicated_values(Field::Phone)?,
            courriel: self.members_of_duplicated_values(Field::Email)?,
        };
        let counts = PerField {
            nom_entreprise: doublons.nom_entreprise.len(),
            telephone: doublons.telephone.len(),
            courriel: doublons.courriel.len(),
        };
        Ok(FieldMembershipReport { doublons, counts })
    }
}
