use std::collections::HashSet;

use super::types::LicenseRecord;
use crate::scene::LicensePair;

/// License key whose value is a texture index for the thumbnail.
const THUMBNAIL_KEY: &str = "texture";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LicenseField {
    Version,
    Author,
    ContactInformation,
    Reference,
    Title,
    AllowedUserName,
    ViolentUsageName,
    SexualUsageName,
    CommercialUsageName,
    OtherPermissionUrl,
    LicenseName,
    OtherLicenseUrl,
}

/// How a key is spelled in the source documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Spelling {
    Canonical,
    /// Historical `Ussage` misspelling; never overrides the canonical key.
    Misspelled,
}

const LICENSE_KEYS: [(&str, LicenseField, Spelling); 15] = [
    ("version", LicenseField::Version, Spelling::Canonical),
    ("author", LicenseField::Author, Spelling::Canonical),
    ("contactInformation", LicenseField::ContactInformation, Spelling::Canonical),
    ("reference", LicenseField::Reference, Spelling::Canonical),
    ("title", LicenseField::Title, Spelling::Canonical),
    ("allowedUserName", LicenseField::AllowedUserName, Spelling::Canonical),
    ("violentUsageName", LicenseField::ViolentUsageName, Spelling::Canonical),
    ("sexualUsageName", LicenseField::SexualUsageName, Spelling::Canonical),
    ("commercialUsageName", LicenseField::CommercialUsageName, Spelling::Canonical),
    ("otherPermissionUrl", LicenseField::OtherPermissionUrl, Spelling::Canonical),
    ("licenseName", LicenseField::LicenseName, Spelling::Canonical),
    ("otherLicenseUrl", LicenseField::OtherLicenseUrl, Spelling::Canonical),
    ("violentUssageName", LicenseField::ViolentUsageName, Spelling::Misspelled),
    ("sexualUssageName", LicenseField::SexualUsageName, Spelling::Misspelled),
    ("commercialUssageName", LicenseField::CommercialUsageName, Spelling::Misspelled),
];

impl LicenseRecord {
    fn field_mut(&mut self, field: LicenseField) -> &mut String {
        match field {
            LicenseField::Version => &mut self.version,
            LicenseField::Author => &mut self.author,
            LicenseField::ContactInformation => &mut self.contact_information,
            LicenseField::Reference => &mut self.reference,
            LicenseField::Title => &mut self.title,
            LicenseField::AllowedUserName => &mut self.allowed_user_name,
            LicenseField::ViolentUsageName => &mut self.violent_usage_name,
            LicenseField::SexualUsageName => &mut self.sexual_usage_name,
            LicenseField::CommercialUsageName => &mut self.commercial_usage_name,
            LicenseField::OtherPermissionUrl => &mut self.other_permission_url,
            LicenseField::LicenseName => &mut self.license_name,
            LicenseField::OtherLicenseUrl => &mut self.other_license_url,
        }
    }
}

/// Build a license record from the importer's flat key/value list.
///
/// Unknown keys are ignored. A repeated key keeps its last value, but a
/// misspelled `Ussage` key never replaces its `Usage` twin. The `texture` key resolves the thumbnail against
/// `textures` when given; a value that is not a valid index leaves the
/// thumbnail unset.
pub fn extract_license(pairs: &[LicensePair], textures: Option<&[String]>) -> LicenseRecord {
    let mut record = LicenseRecord::default();
    let mut canonical_fields = HashSet::<LicenseField>::new();

    for pair in pairs {
        if let Some((_, field, spelling)) = LICENSE_KEYS.iter().find(|(key, ..)| *key == pair.key) {
            let shadowed = *spelling == Spelling::Misspelled && canonical_fields.contains(field);
            if *spelling == Spelling::Canonical {
                canonical_fields.insert(*field);
            }
            if !shadowed {
                *record.field_mut(*field) = pair.value.clone();
            }
        }

        if pair.key == THUMBNAIL_KEY
            && let Some(textures) = textures
            && let Some(thumbnail) = resolve_thumbnail(&pair.value, textures)
        {
            record.thumbnail = Some(thumbnail);
        }
    }

    record
}

fn resolve_thumbnail(value: &str, textures: &[String]) -> Option<String> {
    let Ok(index) = value.trim().parse::<usize>() else {
        log::warn!("license thumbnail index is not a texture index: {value:?}");
        return None;
    };

    let thumbnail = textures.get(index).cloned();
    if thumbnail.is_none() {
        log::debug!("license thumbnail index {index} is outside the texture list");
    }
    thumbnail
}
