//! Function validation (§4.3.6): base-function linking, `signal`/
//! `import`/`override` rules, and the no-shadowing-without-override
//! check. Duplicate argument names are caught at creation time
//! (`create_function_arg`), not re-checked here.

use super::StubLibrary;
use crate::stubs::ids::{ClassId, FunctionId, StubOwner};
use crate::stubs::kinds::{ClassMember, TypeDecl};
use crate::stubs::FunctionFlags;

impl StubLibrary {
    pub fn validate_functions(&mut self) {
        let ids: Vec<FunctionId> = self.functions.ids().collect();
        for &id in &ids {
            self.link_base_function(id);
        }
        for id in ids {
            self.validate_function(id);
        }
    }

    fn owning_class(&self, id: FunctionId) -> Option<ClassId> {
        match self.functions.get(id).owner {
            StubOwner::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Walks the class's base chain for a function of the same simple
    /// name (§4.3.6 "link `baseFunction`").
    fn link_base_function(&mut self, id: FunctionId) {
        let Some(class) = self.owning_class(id) else { return };
        let name = self.functions.get(id).name;
        let mut current = self.classes.get(class).base_resolved;
        while let Some(base_class) = current {
            let found = self
                .classes
                .get(base_class)
                .member_names
                .iter()
                .find_map(|(n, m)| match m {
                    ClassMember::Function(f) if *n == name => Some(*f),
                    _ => None,
                });
            if let Some(base_fn) = found {
                self.functions.get_mut(id).base_function = Some(base_fn);
                return;
            }
            current = self.classes.get(base_class).base_resolved;
        }
    }

    fn validate_function(&mut self, id: FunctionId) {
        let (owner, name, flags, return_type, location) = {
            let f = self.functions.get(id);
            (f.owner, f.name, f.flags, f.return_type, f.location)
        };
        let path = self.file_of_owner(owner).map(|f| self.file_abs_path(f)).unwrap_or_default();
        let class = self.owning_class(id);

        if flags.contains(FunctionFlags::SIGNAL) {
            let class_is_struct = class.map(|c| self.classes.get(c).flags.contains(crate::stubs::ClassFlags::STRUCT)).unwrap_or(true);
            if class.is_none() || class_is_struct {
                self.errors.report_error(path.clone(), location.line, "`signal` functions must be declared inside a class");
            }
            let ok_return = match return_type.map(|t| self.type_decls.get(t)) {
                None => true,
                Some(TypeDecl::Engine(crate::stubs::kinds::EngineType::Bool)) => true,
                Some(TypeDecl::Engine(crate::stubs::kinds::EngineType::Void)) => true,
                _ => false,
            };
            if !ok_return {
                self.errors.report_error(path.clone(), location.line, "`signal` functions must return void or bool");
            }
            if !name.resolve(&self.strings).starts_with("On") {
                self.errors.report_error(path.clone(), location.line, "`signal` function names must start with `On`");
            }
        }

        if flags.contains(FunctionFlags::IMPORT) {
            let class_is_import = class.map(|c| self.classes.get(c).flags.contains(crate::stubs::ClassFlags::IMPORT)).unwrap_or(true);
            if !class_is_import {
                self.errors.report_error(path.clone(), location.line, "`import` function must belong to an `import` class");
            }
        }

        let base_function = self.functions.get(id).base_function;
        if flags.contains(FunctionFlags::OVERRIDE) {
            match base_function {
                None => {
                    self.errors.report_error(path.clone(), location.line, "`override` function has no matching base function");
                }
                Some(base_id) => {
                    if self.functions.get(base_id).flags.contains(FunctionFlags::FINAL) {
                        self.errors.report_error(path.clone(), location.line, "cannot override a `final` function");
                    } else if !self.signatures_match(id, base_id) {
                        self.errors.report_error(
                            path.clone(),
                            location.line,
                            format!("`{}` does not match signature of the base function", name.resolve(&self.strings)),
                        );
                    }
                }
            }
        } else if base_function.is_some() {
            self.errors.report_error(path, location.line, format!("`{}` shadows a base class function without `override`", name.resolve(&self.strings)));
        }
    }

    /// Same arity, pairwise identical argument types including `ref`/
    /// `out`/`explicit`, identical return type (§4.3.6 `override`).
    fn signatures_match(&self, a: FunctionId, b: FunctionId) -> bool {
        let fa = self.functions.get(a);
        let fb = self.functions.get(b);
        if fa.args.len() != fb.args.len() {
            return false;
        }
        if !option_types_equal(self, fa.return_type, fb.return_type) {
            return false;
        }
        for (&arg_a, &arg_b) in fa.args.iter().zip(fb.args.iter()) {
            let pa = self.function_args.get(arg_a);
            let pb = self.function_args.get(arg_b);
            if pa.flags != pb.flags {
                return false;
            }
            if !TypeDecl::structurally_equal(pa.type_decl, pb.type_decl, &self.type_decls, &self.type_refs) {
                return false;
            }
        }
        true
    }
}

fn option_types_equal(lib: &StubLibrary, a: Option<crate::stubs::ids::TypeDeclId>, b: Option<crate::stubs::ids::TypeDeclId>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => TypeDecl::structurally_equal(a, b, &lib.type_decls, &lib.type_refs),
        _ => false,
    }
}

