//! The parse run: umbrella headers, castxml passes, builders, cache.
//!
//! ```text
//! Unconfigured -> Configured -> CachedReuse -> Ready
//!                            \-> FullReparse -/
//! ```
//!
//! A run reuses `<root>-out.json` when every synthesized header is byte-for-byte
//! unchanged and `force` is off. Otherwise it captures macros, writes the
//! extension headers, runs castxml to `<root>-gcc.xml`, builds the module and
//! persists it.

use std::fs;
use std::path::PathBuf;

use hdr_config::{HdrConfig, NoRegistry, RegistryLookup, Variables};
use hdr_core::{CppDecl, CppDefine, CppInclude, CppModule};
use roxmltree::Document;

use crate::builders::DeclBuilder;
use crate::castxml::{DiagnosticRouter, ExternalParser};
use crate::docs::{DocumentationProvider, apply_documentation, load_provider};
use crate::error::ParserError;
use crate::headers::{self, write_if_changed};
use crate::index::DeclIndex;
use crate::logger::Logger;
use crate::macros::{MacroManager, MacroSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Unconfigured,
    Configured,
    CachedReuse,
    FullReparse,
    Ready,
}

pub struct CppParser {
    config: HdrConfig,
    parser: Box<dyn ExternalParser>,
    docs: Option<Box<dyn DocumentationProvider>>,
    registry: Box<dyn RegistryLookup>,
    log: Logger,
    state: DriverState,
    include_dirs: Vec<PathBuf>,
    headers_changed: bool,
    variables: Variables,
    module: Option<CppModule>,
}

impl CppParser {
    #[must_use]
    pub fn new(config: HdrConfig, parser: Box<dyn ExternalParser>) -> Self {
        let variables = config.variable_table();
        Self {
            config,
            parser,
            docs: None,
            registry: Box::new(NoRegistry),
            log: Logger::new(),
            state: DriverState::Unconfigured,
            include_dirs: Vec::new(),
            headers_changed: false,
            variables,
            module: None,
        }
    }

    /// Use `provider` instead of the configured documentation file.
    #[must_use]
    pub fn with_documentation(mut self, provider: Box<dyn DocumentationProvider>) -> Self {
        self.docs = Some(provider);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Box<dyn RegistryLookup>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub const fn state(&self) -> DriverState {
        self.state
    }

    #[must_use]
    pub const fn logger(&self) -> &Logger {
        &self.log
    }

    /// Configuration, with variables expanded once the run is ready.
    #[must_use]
    pub const fn config(&self) -> &HdrConfig {
        &self.config
    }

    #[must_use]
    pub const fn variables(&self) -> &Variables {
        &self.variables
    }

    #[must_use]
    pub const fn module(&self) -> Option<&CppModule> {
        self.module.as_ref()
    }

    #[must_use]
    pub fn into_module(self) -> Option<CppModule> {
        self.module
    }

    /// Write the umbrella headers and resolve include directories.
    ///
    /// Returns whether any umbrella header changed on disk.
    ///
    /// # Errors
    /// Returns `ParserError::Io` when the output directory or a header cannot be written.
    pub fn configure(&mut self) -> Result<bool, ParserError> {
        let output = &self.config.output;
        fs::create_dir_all(output.directory()).map_err(|e| ParserError::io(output.directory(), e))?;

        let statics = self.config.variable_table();
        let mut changed = false;
        for unit in &self.config.units {
            let text = statics.expand(&headers::unit_header(unit));
            changed |= write_if_changed(&output.unit_header(&unit.id), &text)?;

            let extension = output.unit_extension_header(&unit.id);
            if unit.has_macro_rules() && !extension.exists() {
                fs::write(&extension, headers::pending_extension_header(unit))
                    .map_err(|e| ParserError::io(&extension, e))?;
            }
        }
        let root = headers::root_header(&self.config.units, &self.config.bindings);
        changed |= write_if_changed(&output.root_header(), &root)?;

        self.include_dirs = self.resolve_include_dirs();
        self.headers_changed = changed;
        self.state = DriverState::Configured;
        Ok(changed)
    }

    fn resolve_include_dirs(&mut self) -> Vec<PathBuf> {
        let mut dirs = Vec::with_capacity(self.config.include_dirs.len());
        for entry in &self.config.include_dirs {
            match entry.resolve(self.registry.as_ref()) {
                Ok(dir) => dirs.push(dir),
                Err(error) => self.log.error(format!("Skipping include directory: {error}")),
            }
        }
        dirs
    }

    /// Produce the module, from cache when possible.
    ///
    /// # Errors
    /// Returns the fatal `ParserError`s: missing root header, failed castxml
    /// pass, missing XML output, unresolvable type chains, I/O failures.
    pub fn run(&mut self) -> Result<&CppModule, ParserError> {
        if self.state != DriverState::Ready || self.module.is_none() {
            let module = self.produce()?;
            self.finish(&module);
            self.module = Some(module);
        }
        Ok(self.module.get_or_insert_default())
    }

    fn produce(&mut self) -> Result<CppModule, ParserError> {
        if self.state == DriverState::Unconfigured {
            self.configure()?;
        }

        let cache = self.config.output.module_cache();
        if !self.headers_changed && !self.config.output.force && cache.is_file() {
            self.state = DriverState::CachedReuse;
            match CppModule::read_from(&cache) {
                Ok(module) => {
                    self.log.info(format!("Headers unchanged, reusing {}", cache.display()));
                    return Ok(module);
                }
                Err(error) => self.log.warning(format!("Ignoring unreadable cache: {error}")),
            }
        }

        self.state = DriverState::FullReparse;
        self.reparse()
    }

    fn reparse(&mut self) -> Result<CppModule, ParserError> {
        let output = self.config.output.clone();
        let root = output.root_header();
        if !root.is_file() {
            return Err(ParserError::HeaderNotFound(root));
        }

        let cache = output.module_cache();
        let xml_path = output.castxml_output();
        for stale in [&cache, &xml_path] {
            if stale.is_file() {
                fs::remove_file(stale).map_err(|e| ParserError::io(stale, e))?;
            }
        }

        let router = DiagnosticRouter::new(&self.config.castxml.diagnostic_filters)?;
        let macros = MacroManager::new(self.parser.as_ref()).capture(
            &root,
            &self.include_dirs,
            &router,
            &mut self.log,
        )?;
        self.log.info(format!("Captured {} macros", macros.len()));

        for unit in self.config.units.iter().filter(|u| u.has_macro_rules()) {
            let text = headers::extension_header(unit, &macros, &mut self.log)?;
            write_if_changed(&output.unit_extension_header(&unit.id), &text)?;
        }

        self.log.push_context("castxml");
        let result = self.parser.emit_xml(&root, &self.include_dirs, &xml_path);
        if let Ok(result) = &result {
            router.route(&result.stderr, &mut self.log);
        }
        self.log.pop_context();
        if !result?.success {
            return Err(ParserError::ProcessFailed {
                stage: "emitting xml".into(),
                message: format!("{} error(s) reported", self.log.error_count()),
            });
        }
        if !xml_path.is_file() {
            return Err(ParserError::NoXmlOutput(xml_path));
        }

        let text = fs::read_to_string(&xml_path).map_err(|e| ParserError::io(&xml_path, e))?;
        let doc = Document::parse(&text)?;
        let index = DeclIndex::build(&doc);
        self.log.info(format!("Indexed {} castxml elements", index.len()));

        let mut module = self.build_module(&index)?;
        attach_defines(&mut module, &macros);

        if self.docs.is_none() {
            self.docs = Some(load_provider(output.doc_file.as_deref(), &mut self.log));
        }
        if let Some(provider) = &self.docs {
            apply_documentation(&mut module, provider.as_ref());
        }

        module.write_to(&cache)?;
        self.log.info(format!(
            "Built {} declarations in {} includes",
            module.decls().count(),
            module.includes.len()
        ));
        Ok(module)
    }

    fn build_module(&mut self, index: &DeclIndex<'_, '_>) -> Result<CppModule, ParserError> {
        let mut module = CppModule::default();
        let mut builder = DeclBuilder::new(index, &self.config.bindings, &mut self.log);

        for unit in &self.config.units {
            for rule in &unit.includes {
                let include = builder.build_include(&rule.include_id(), |name| rule.is_attached(name))?;
                merge_include(&mut module, include);
            }
            if unit.has_macro_rules() {
                let include = builder.build_include(&unit.extension_include_id(), |_| true)?;
                merge_include(&mut module, include);
            }
        }
        Ok(module)
    }

    /// Fold captured macros into the dynamic variables and expand the configuration.
    fn finish(&mut self, module: &CppModule) {
        let macros = MacroSet::from_module(module);
        let mut variables = self.config.variable_table();
        variables.extend_dynamic(macros.dynamic_variables());
        self.config.expand_variables(&variables);
        self.variables = variables;
        self.state = DriverState::Ready;
    }
}

/// Add an include's declarations, skipping names the module already has for that include.
fn merge_include(module: &mut CppModule, include: CppInclude) {
    let target = module.include_mut(&include.name);
    for decl in include.decls {
        if target.find(decl.name()).is_none() {
            target.push(decl);
        }
    }
}

fn attach_defines(module: &mut CppModule, macros: &MacroSet) {
    for include in &mut module.includes {
        let Some(defines) = macros.for_header(&include.name) else {
            continue;
        };
        for (name, value) in defines {
            include.push(CppDecl::Define(CppDefine {
                name: name.clone(),
                value: value.clone(),
            }));
        }
    }
}
