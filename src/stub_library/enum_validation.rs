//! Enum validation (§4.3.4): sequential value assignment for options the
//! user didn't give an explicit value, plus the import/duplicate checks.

use super::StubLibrary;
use crate::stubs::ids::EnumId;

impl StubLibrary {
    pub fn validate_enums(&mut self) {
        let ids: Vec<EnumId> = self.enums.ids().collect();
        for id in ids {
            self.validate_enum(id);
        }
    }

    fn validate_enum(&mut self, id: EnumId) {
        let (owner, flags, options, location) = {
            let e = self.enums.get(id);
            (e.owner, e.flags, e.options.clone(), e.location)
        };
        let is_import = flags.contains(crate::stubs::MemberFlags::IMPORT);

        let mut next_value: i64 = 0;
        let mut seen_values = std::collections::HashSet::new();
        for &option in &options {
            let (has_user_value, user_value) = {
                let o = self.enum_options.get(option);
                (o.has_user_assigned_value, o.value)
            };
            if has_user_value && is_import {
                let path = self.file_of_owner(owner).map(|f| self.file_abs_path(f)).unwrap_or_default();
                self.errors.report_error(path, location.line, "imported enums may not carry user-assigned option values");
            }
            let value = if has_user_value {
                user_value
            } else {
                next_value
            };
            self.enum_options.get_mut(option).value = value;
            next_value = value + 1;

            if !seen_values.insert(value) {
                let opt_loc = self.enum_options.get(option).location;
                let path = self.file_of_owner(owner).map(|f| self.file_abs_path(f)).unwrap_or_default();
                self.errors.report_warning(path, opt_loc.line, format!("duplicate enum value {value}"));
            }
        }
    }
}
