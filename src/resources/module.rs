use super::MODULE_GRID;
use resource_framework::{FieldType, Operation, ResourceDescriptor};

pub fn resource() -> ResourceDescriptor {
    ResourceDescriptor::new("Module")
        .identifier("moduleId")
        .field("moduleId", FieldType::Int)
        .field("technicalName", FieldType::String)
        .field("version", FieldType::String)
        .nullable_field("installedVersion", FieldType::String)
        .field("enabled", FieldType::Bool)
        .operation(
            Operation::get("module_list", "/modules")
                .scopes(["module_read"])
                .grid(MODULE_GRID)
                .result_mapping([
                    ("id_module", "moduleId"),
                    ("name", "technicalName"),
                    ("installed_version", "installedVersion"),
                    ("active", "enabled"),
                ]),
        )
}
