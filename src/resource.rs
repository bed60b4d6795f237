//! Dealing with PDF resources.
//!
//! Content streams refer to graphics states, images and fonts by name. Each
//! content stream collects the objects it uses in a [`ResourceDictionaryBuilder`],
//! which hands out names like `g0` or `x1` and later turns into the resource
//! dictionary of the page.

use std::collections::HashMap;
use std::marker::PhantomData;

use pdf_writer::types::ProcSet;
use pdf_writer::writers::Resources;
use pdf_writer::{Dict, Finish, Ref};

use crate::util::NameExt;

pub(crate) trait ResourceTrait {
    fn get_dict<'a>(resources: &'a mut Resources) -> Dict<'a>;
    fn get_prefix() -> &'static str;
    fn get_mapper(b: &mut ResourceDictionaryBuilder) -> &mut ResourceMapper<Self>;
}

#[derive(Debug, Eq, PartialEq, Hash, Default, Clone)]
pub(crate) struct ExtGState;

impl ResourceTrait for ExtGState {
    fn get_dict<'a>(resources: &'a mut Resources) -> Dict<'a> {
        resources.ext_g_states()
    }

    fn get_prefix() -> &'static str {
        "g"
    }

    fn get_mapper(b: &mut ResourceDictionaryBuilder) -> &mut ResourceMapper<ExtGState> {
        &mut b.ext_g_states
    }
}

#[derive(Debug, Eq, PartialEq, Hash, Default, Clone)]
pub(crate) struct XObject;

impl ResourceTrait for XObject {
    fn get_dict<'a>(resources: &'a mut Resources) -> Dict<'a> {
        resources.x_objects()
    }

    fn get_prefix() -> &'static str {
        "x"
    }

    fn get_mapper(b: &mut ResourceDictionaryBuilder) -> &mut ResourceMapper<XObject> {
        &mut b.x_objects
    }
}

#[derive(Debug, Eq, PartialEq, Hash, Default, Clone)]
pub(crate) struct Font;

impl ResourceTrait for Font {
    fn get_dict<'a>(resources: &'a mut Resources) -> Dict<'a> {
        resources.fonts()
    }

    fn get_prefix() -> &'static str {
        "f"
    }

    fn get_mapper(b: &mut ResourceDictionaryBuilder) -> &mut ResourceMapper<Font> {
        &mut b.fonts
    }
}

#[derive(Debug)]
pub(crate) struct ResourceDictionaryBuilder {
    pub ext_g_states: ResourceMapper<ExtGState>,
    pub x_objects: ResourceMapper<XObject>,
    pub fonts: ResourceMapper<Font>,
}

impl ResourceDictionaryBuilder {
    pub fn new() -> Self {
        Self {
            ext_g_states: ResourceMapper::new(),
            x_objects: ResourceMapper::new(),
            fonts: ResourceMapper::new(),
        }
    }

    /// Register an already serialized object and return the name it can be
    /// referred to with. Registering the same object twice yields the same name.
    pub(crate) fn register_resource<T>(&mut self, ref_: Ref) -> String
    where
        T: ResourceTrait,
    {
        T::get_mapper(self).remap_with_name(ref_)
    }

    pub fn finish(self) -> ResourceDictionary {
        ResourceDictionary {
            ext_g_states: self.ext_g_states.into_resource_list(),
            x_objects: self.x_objects.into_resource_list(),
            fonts: self.fonts.into_resource_list(),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Hash, Default, Clone)]
pub(crate) struct ResourceDictionary {
    pub ext_g_states: ResourceList<ExtGState>,
    pub x_objects: ResourceList<XObject>,
    pub fonts: ResourceList<Font>,
}

impl ResourceDictionary {
    pub fn to_pdf_resources(&self, resources: &mut Resources) {
        resources.proc_sets([
            ProcSet::Pdf,
            ProcSet::Text,
            ProcSet::ImageColor,
            ProcSet::ImageGrayscale,
        ]);
        write_resource_type::<ExtGState>(resources, &self.ext_g_states);
        write_resource_type::<XObject>(resources, &self.x_objects);
        write_resource_type::<Font>(resources, &self.fonts);
    }
}

fn write_resource_type<T>(resources: &mut Resources, resource_list: &ResourceList<T>)
where
    T: ResourceTrait,
{
    if resource_list.len() > 0 {
        let mut dict = T::get_dict(resources);

        for (name, entry) in resource_list.get_entries() {
            dict.pair(name.to_pdf_name(), entry);
        }

        dict.finish();
    }
}

#[derive(Debug, Eq, PartialEq, Hash, Clone, Default)]
pub(crate) struct ResourceList<V> {
    entries: Vec<Ref>,
    phantom: PhantomData<V>,
}

impl<T> ResourceList<T>
where
    T: ResourceTrait,
{
    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    fn name_from_number(num: ResourceNumber) -> String {
        format!("{}{}", T::get_prefix(), num)
    }

    pub fn get_entries(&self) -> impl Iterator<Item = (String, Ref)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, r)| (Self::name_from_number(i as ResourceNumber), *r))
    }
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) struct ResourceMapper<T: ?Sized> {
    forward: Vec<Ref>,
    backward: HashMap<Ref, ResourceNumber>,
    phantom: PhantomData<T>,
}

impl<T> ResourceMapper<T>
where
    T: ResourceTrait,
{
    pub fn new() -> Self {
        Self {
            forward: Vec::new(),
            backward: HashMap::new(),
            phantom: PhantomData,
        }
    }

    pub fn remap(&mut self, ref_: Ref) -> ResourceNumber {
        let forward = &mut self.forward;
        let backward = &mut self.backward;

        *backward.entry(ref_).or_insert_with(|| {
            let old = forward.len();
            forward.push(ref_);
            old as ResourceNumber
        })
    }

    pub fn remap_with_name(&mut self, ref_: Ref) -> String {
        Self::name_from_number(self.remap(ref_))
    }

    fn name_from_number(num: ResourceNumber) -> String {
        format!("{}{}", T::get_prefix(), num)
    }

    pub fn into_resource_list(self) -> ResourceList<T> {
        ResourceList {
            entries: self.forward,
            phantom: Default::default(),
        }
    }
}

pub type ResourceNumber = u32;
