#![forbid(unsafe_code)]

macro_rules! resource_columns {
    () => {
        "r.resource_id, r.type_id, r.flags, r.size, r.date_content, r.date_created, \
         r.user_created, r.date_last_modified, r.user_last_modified, r.state, \
         r.sibling_count, r.resource_version, r.publish_tag"
    };
}

macro_rules! structure_columns {
    () => {
        "s.structure_id, s.resource_id, s.path, s.parent_id, s.date_released, \
         s.date_expired, s.state, s.structure_version, s.publish_tag"
    };
}

/// Column offset of the resource part in a [`Query::DirectVersions`] row.
pub(in crate::store) const DIRECT_RESOURCE_OFFSET: usize = 9;

/// Every statement the history driver runs, by logical name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::store) enum Query {
    DirectVersions,
    ResourcesAfter,
    ResourcesBetween,
    ResourcesBefore,
    LastVersion,
    MaxPublishTag,
    NextPublishTag,
    PublishTagAtDate,
    ReadContent,
    HistoryStructureIds,
    HistoryStructureIdsByPath,

    ResourceRowExists,
    InsertResource,
    InsertContent,
    InsertStructure,

    PropertyDefByName,
    InsertPropertyDef,
    PropertyDefReferences,
    DeletePropertyDef,
    InsertProperty,
    StructurePropertyTag,
    PropertiesAtTag,
    ResourcePropertiesAtTag,

    MaxStructureVersion,
    MaxStructureVersionByDate,
    StructureTagUpToVersion,
    DeleteStructureProperties,
    DeleteStructureRows,
    ResourceReferences,
    DeleteResourceRows,
    DeleteContents,
    StructureChildren,

    PrincipalExists,
    InsertPrincipal,
    ReadPrincipal,
    InsertProject,
    InsertProjectResource,
    ReadProject,
    ReadProjects,
    ReadProjectResources,

    DeleteVisit,
    InsertVisit,
    ReadVisits,
    DeleteVisitsBefore,
    Subscribe,
    Unsubscribe,
    MarkSubscriptionsDeleted,
    ReadSubscribed,
    DeleteSubscriptionsDeletedBefore,
}

impl Query {
    pub(in crate::store) fn name(self) -> &'static str {
        match self {
            Self::DirectVersions => "history.direct_versions",
            Self::ResourcesAfter => "history.resources_after",
            Self::ResourcesBetween => "history.resources_between",
            Self::ResourcesBefore => "history.resources_before",
            Self::LastVersion => "history.last_version",
            Self::MaxPublishTag => "history.max_publish_tag",
            Self::NextPublishTag => "history.next_publish_tag",
            Self::PublishTagAtDate => "history.publish_tag_at_date",
            Self::ReadContent => "history.read_content",
            Self::HistoryStructureIds => "history.structure_ids",
            Self::HistoryStructureIdsByPath => "history.structure_ids_by_path",
            Self::ResourceRowExists => "history.resource_row_exists",
            Self::InsertResource => "history.insert_resource",
            Self::InsertContent => "history.insert_content",
            Self::InsertStructure => "history.insert_structure",
            Self::PropertyDefByName => "properties.def_by_name",
            Self::InsertPropertyDef => "properties.insert_def",
            Self::PropertyDefReferences => "properties.def_references",
            Self::DeletePropertyDef => "properties.delete_def",
            Self::InsertProperty => "properties.insert",
            Self::StructurePropertyTag => "properties.structure_tag",
            Self::PropertiesAtTag => "properties.at_tag",
            Self::ResourcePropertiesAtTag => "properties.resource_at_tag",
            Self::MaxStructureVersion => "prune.max_structure_version",
            Self::MaxStructureVersionByDate => "prune.max_structure_version_by_date",
            Self::StructureTagUpToVersion => "prune.structure_tag_up_to_version",
            Self::DeleteStructureProperties => "prune.delete_structure_properties",
            Self::DeleteStructureRows => "prune.delete_structure_rows",
            Self::ResourceReferences => "prune.resource_references",
            Self::DeleteResourceRows => "prune.delete_resource_rows",
            Self::DeleteContents => "prune.delete_contents",
            Self::StructureChildren => "prune.structure_children",
            Self::PrincipalExists => "audit.principal_exists",
            Self::InsertPrincipal => "audit.insert_principal",
            Self::ReadPrincipal => "audit.read_principal",
            Self::InsertProject => "audit.insert_project",
            Self::InsertProjectResource => "audit.insert_project_resource",
            Self::ReadProject => "audit.read_project",
            Self::ReadProjects => "audit.read_projects",
            Self::ReadProjectResources => "audit.read_project_resources",
            Self::DeleteVisit => "visits.delete",
            Self::InsertVisit => "visits.insert",
            Self::ReadVisits => "visits.read",
            Self::DeleteVisitsBefore => "visits.delete_before",
            Self::Subscribe => "subscriptions.subscribe",
            Self::Unsubscribe => "subscriptions.unsubscribe",
            Self::MarkSubscriptionsDeleted => "subscriptions.mark_deleted",
            Self::ReadSubscribed => "subscriptions.read",
            Self::DeleteSubscriptionsDeletedBefore => "subscriptions.delete_deleted_before",
        }
    }

    pub(in crate::store) fn sql(self) -> &'static str {
        match self {
            Self::DirectVersions => concat!(
                "SELECT ",
                structure_columns!(),
                ", ",
                resource_columns!(),
                " FROM history_structure s \
                 LEFT JOIN history_resources r \
                   ON r.resource_id = s.resource_id \
                  AND r.publish_tag = ( \
                      SELECT MAX(r2.publish_tag) FROM history_resources r2 \
                      WHERE r2.resource_id = s.resource_id AND r2.publish_tag <= s.publish_tag) \
                 WHERE s.structure_id = ?1 \
                 ORDER BY s.publish_tag DESC"
            ),
            Self::ResourcesAfter => concat!(
                "SELECT ",
                resource_columns!(),
                " FROM history_resources r \
                 WHERE r.resource_id = ?1 AND r.publish_tag > ?2 \
                 ORDER BY r.publish_tag ASC"
            ),
            Self::ResourcesBetween => concat!(
                "SELECT ",
                resource_columns!(),
                " FROM history_resources r \
                 WHERE r.resource_id = ?1 AND r.publish_tag > ?2 AND r.publish_tag < ?3 \
                 ORDER BY r.publish_tag ASC"
            ),
            Self::ResourcesBefore => concat!(
                "SELECT ",
                resource_columns!(),
                " FROM history_resources r \
                 WHERE r.resource_id = ?1 AND r.publish_tag < ?2 \
                 ORDER BY r.publish_tag DESC"
            ),
            Self::LastVersion => {
                "SELECT COALESCE((SELECT MAX(structure_version) FROM history_structure \
                                  WHERE structure_id = ?1), 0) \
                      + COALESCE((SELECT MAX(r.resource_version) FROM history_resources r \
                                  WHERE r.resource_id IN ( \
                                      SELECT resource_id FROM history_structure \
                                      WHERE structure_id = ?1)), 0)"
            }
            Self::MaxPublishTag => {
                "SELECT MAX(publish_tag) FROM history_resources WHERE resource_id = ?1"
            }
            Self::NextPublishTag => {
                "SELECT MAX(tag) FROM ( \
                   SELECT MAX(publish_tag) AS tag FROM history_projects \
                   UNION ALL SELECT MAX(publish_tag) FROM history_resources \
                   UNION ALL SELECT MAX(publish_tag) FROM history_contents)"
            }
            Self::PublishTagAtDate => {
                "SELECT MAX(publish_tag) FROM history_projects WHERE publish_date <= ?1"
            }
            Self::ReadContent => {
                "SELECT data FROM history_contents \
                 WHERE resource_id = ?1 AND publish_tag <= ?2 \
                 ORDER BY publish_tag DESC LIMIT 1"
            }
            Self::HistoryStructureIds => {
                "SELECT DISTINCT structure_id FROM history_structure \
                 WHERE (?1 IS NULL OR parent_id = ?1) \
                 ORDER BY structure_id"
            }
            Self::HistoryStructureIdsByPath => {
                "SELECT DISTINCT structure_id FROM history_structure \
                 WHERE substr(path, 1, length(?1)) = ?1 \
                 ORDER BY structure_id"
            }
            Self::ResourceRowExists => {
                "SELECT COUNT(1) FROM history_resources WHERE resource_id = ?1 AND publish_tag = ?2"
            }
            Self::InsertResource => {
                "INSERT INTO history_resources( \
                   resource_id, type_id, flags, size, date_content, date_created, user_created, \
                   date_last_modified, user_last_modified, state, sibling_count, \
                   resource_version, publish_tag) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            }
            Self::InsertContent => {
                "INSERT OR IGNORE INTO history_contents(resource_id, publish_tag, data, keep_permanently) \
                 VALUES (?1, ?2, ?3, ?4)"
            }
            Self::InsertStructure => {
                "INSERT INTO history_structure( \
                   structure_id, resource_id, path, parent_id, date_released, date_expired, \
                   state, structure_version, publish_tag) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            }
            Self::PropertyDefByName => {
                "SELECT def_id, name FROM history_property_defs WHERE name = ?1"
            }
            Self::InsertPropertyDef => {
                "INSERT INTO history_property_defs(def_id, name) VALUES (?1, ?2)"
            }
            Self::PropertyDefReferences => {
                "SELECT COUNT(1) FROM history_properties WHERE def_id = ?1"
            }
            Self::DeletePropertyDef => "DELETE FROM history_property_defs WHERE def_id = ?1",
            Self::InsertProperty => {
                "INSERT INTO history_properties( \
                   structure_id, mapping_id, def_id, mapping_type, value, publish_tag) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            }
            Self::StructurePropertyTag => {
                "SELECT MAX(publish_tag) FROM history_properties \
                 WHERE mapping_id = ?1 AND mapping_type = ?2 AND publish_tag <= ?3"
            }
            Self::PropertiesAtTag => {
                "SELECT d.name, p.mapping_type, p.value \
                 FROM history_properties p \
                 JOIN history_property_defs d ON d.def_id = p.def_id \
                 WHERE p.structure_id = ?1 AND p.publish_tag = ?2"
            }
            Self::ResourcePropertiesAtTag => {
                "SELECT DISTINCT d.name, p.mapping_type, p.value \
                 FROM history_properties p \
                 JOIN history_property_defs d ON d.def_id = p.def_id \
                 WHERE p.mapping_id = ?1 AND p.mapping_type = ?2 AND p.publish_tag = ?3"
            }
            Self::MaxStructureVersion => {
                "SELECT MAX(structure_version) FROM history_structure WHERE structure_id = ?1"
            }
            Self::MaxStructureVersionByDate => {
                "SELECT MAX(s.structure_version) \
                 FROM history_structure s \
                 JOIN history_projects p ON p.publish_tag = s.publish_tag \
                 WHERE s.structure_id = ?1 AND p.publish_date <= ?2"
            }
            Self::StructureTagUpToVersion => {
                "SELECT MAX(publish_tag) FROM history_structure \
                 WHERE structure_id = ?1 AND structure_version <= ?2"
            }
            Self::DeleteStructureProperties => {
                "DELETE FROM history_properties WHERE structure_id = ?1 AND publish_tag < ?2"
            }
            Self::DeleteStructureRows => {
                "DELETE FROM history_structure WHERE structure_id = ?1 AND publish_tag < ?2"
            }
            Self::ResourceReferences => {
                "SELECT COUNT(1), MIN(( \
                   SELECT MAX(r.publish_tag) FROM history_resources r \
                   WHERE r.resource_id = s.resource_id AND r.publish_tag <= s.publish_tag)) \
                 FROM history_structure s WHERE s.resource_id = ?1"
            }
            Self::DeleteResourceRows => {
                "DELETE FROM history_resources WHERE resource_id = ?1 AND publish_tag < ?2"
            }
            Self::DeleteContents => {
                "DELETE FROM history_contents \
                 WHERE resource_id = ?1 AND publish_tag < ?2 AND keep_permanently = 0"
            }
            Self::StructureChildren => {
                "SELECT DISTINCT structure_id FROM history_structure WHERE parent_id = ?1"
            }
            Self::PrincipalExists => {
                "SELECT COUNT(1) FROM history_principals WHERE principal_id = ?1"
            }
            Self::InsertPrincipal => {
                "INSERT INTO history_principals( \
                   principal_id, name, ou, description, email, kind, deleted_by, deleted_date) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            }
            Self::ReadPrincipal => {
                "SELECT principal_id, name, ou, description, email, kind, deleted_by, deleted_date \
                 FROM history_principals WHERE principal_id = ?1"
            }
            Self::InsertProject => {
                "INSERT INTO history_projects( \
                   publish_tag, project_id, name, description, owner_id, user_group_id, \
                   manager_group_id, date_created, published_by, publish_date) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            }
            Self::InsertProjectResource => {
                "INSERT OR IGNORE INTO history_project_resources(publish_tag, path) VALUES (?1, ?2)"
            }
            Self::ReadProject => {
                "SELECT publish_tag, project_id, name, description, owner_id, user_group_id, \
                        manager_group_id, date_created, published_by, publish_date \
                 FROM history_projects WHERE publish_tag = ?1"
            }
            Self::ReadProjects => {
                "SELECT publish_tag, project_id, name, description, owner_id, user_group_id, \
                        manager_group_id, date_created, published_by, publish_date \
                 FROM history_projects ORDER BY publish_tag DESC LIMIT ?1"
            }
            Self::ReadProjectResources => {
                "SELECT path FROM history_project_resources WHERE publish_tag = ?1 ORDER BY path"
            }
            Self::DeleteVisit => "DELETE FROM visits WHERE user_id = ?1 AND structure_id = ?2",
            Self::InsertVisit => {
                "INSERT INTO visits(user_id, structure_id, date_visited) VALUES (?1, ?2, ?3)"
            }
            Self::ReadVisits => {
                "SELECT user_id, structure_id, date_visited FROM visits \
                 WHERE user_id = ?1 AND (?2 IS NULL OR date_visited >= ?2) \
                 ORDER BY date_visited DESC, structure_id ASC"
            }
            Self::DeleteVisitsBefore => "DELETE FROM visits WHERE date_visited < ?1",
            Self::Subscribe => {
                "INSERT INTO subscriptions(principal_id, structure_id, date_deleted) \
                 VALUES (?1, ?2, 0) \
                 ON CONFLICT(principal_id, structure_id) DO UPDATE SET date_deleted = 0"
            }
            Self::Unsubscribe => {
                "DELETE FROM subscriptions WHERE principal_id = ?1 AND structure_id = ?2"
            }
            Self::MarkSubscriptionsDeleted => {
                "UPDATE subscriptions SET date_deleted = ?2 \
                 WHERE structure_id = ?1 AND date_deleted = 0"
            }
            Self::ReadSubscribed => {
                "SELECT principal_id, structure_id, date_deleted FROM subscriptions \
                 WHERE principal_id = ?1 AND (?2 OR date_deleted = 0) \
                 ORDER BY structure_id"
            }
            Self::DeleteSubscriptionsDeletedBefore => {
                "DELETE FROM subscriptions WHERE date_deleted > 0 AND date_deleted < ?1"
            }
        }
    }
}
