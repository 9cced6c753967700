//! In-memory sample documents for tests.
//!
//! [`sample_form`] carries one field of every kind the engine reports:
//!
//! | name             | kind     | notes                                  |
//! |------------------|----------|----------------------------------------|
//! | `Name`           | text     | required, `MaxLen` 40                  |
//! | `Subscribe`      | checkbox | on state `Yes`                         |
//! | `Color`          | radio    | two widgets, `Red` and `Blue`          |
//! | `Country`        | dropdown | `DE`, `FR`, `US`; value `DE`           |
//! | `Address.Street` | text     | nested under a non-terminal `Address`  |
//!
//! plus a `Submit` push button, which is never listed.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Fully qualified names of the fillable fields in [`sample_form`], in
/// document order.
pub const SAMPLE_FIELDS: [&str; 5] = ["Name", "Subscribe", "Color", "Country", "Address.Street"];

fn name(s: &str) -> Object {
    Object::Name(s.as_bytes().to_vec())
}

fn rect(x: i64, y: i64, w: i64, h: i64) -> Object {
    Object::Array(vec![
        Object::Integer(x),
        Object::Integer(y),
        Object::Integer(x + w),
        Object::Integer(y + h),
    ])
}

fn appearance(doc: &mut Document) -> ObjectId {
    let dict = dictionary! {
        "Type" => name("XObject"),
        "Subtype" => name("Form"),
        "BBox" => rect(0, 0, 12, 12),
    };
    doc.add_object(Stream::new(dict, Vec::new()))
}

/// A widget annotation on `page` carrying the extra `entries`.
fn widget(page: ObjectId, y: i64, entries: Dictionary) -> Dictionary {
    let mut dict = dictionary! {
        "Type" => name("Annot"),
        "Subtype" => name("Widget"),
        "Rect" => rect(72, y, 200, 20),
        "P" => Object::Reference(page),
    };
    for (key, value) in entries.iter() {
        dict.set(key.clone(), value.clone());
    }
    dict
}

/// Wrap the given top-level fields and widgets into a one-page document.
fn finish(
    mut doc: Document,
    pages: ObjectId,
    page: ObjectId,
    fields: Vec<ObjectId>,
    widgets: Vec<ObjectId>,
) -> Result<Vec<u8>, lopdf::Error> {
    doc.objects.insert(
        page,
        Object::Dictionary(dictionary! {
            "Type" => name("Page"),
            "Parent" => Object::Reference(pages),
            "MediaBox" => rect(0, 0, 612, 792),
            "Annots" => Object::Array(widgets.into_iter().map(Object::Reference).collect()),
        }),
    );
    doc.objects.insert(
        pages,
        Object::Dictionary(dictionary! {
            "Type" => name("Pages"),
            "Kids" => Object::Array(vec![Object::Reference(page)]),
            "Count" => Object::Integer(1),
        }),
    );

    let mut catalog = dictionary! {
        "Type" => name("Catalog"),
        "Pages" => Object::Reference(pages),
    };
    if !fields.is_empty() {
        let form = doc.add_object(dictionary! {
            "Fields" => Object::Array(fields.into_iter().map(Object::Reference).collect()),
        });
        catalog.set("AcroForm", Object::Reference(form));
    }
    let catalog = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog));

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

/// A one-page document with the fields listed in the module docs.
pub fn sample_form() -> Result<Vec<u8>, lopdf::Error> {
    let mut doc = Document::with_version("1.7");
    let pages = doc.new_object_id();
    let page = doc.new_object_id();
    let on = appearance(&mut doc);
    let off = appearance(&mut doc);
    let states = |on_name: &str| {
        let mut normal = Dictionary::new();
        normal.set(on_name, Object::Reference(on));
        normal.set("Off", Object::Reference(off));
        Object::Dictionary(dictionary! { "N" => Object::Dictionary(normal) })
    };

    let name_field = doc.add_object(widget(
        page,
        700,
        dictionary! {
            "FT" => name("Tx"),
            "T" => Object::string_literal("Name"),
            "Ff" => Object::Integer(2),
            "MaxLen" => Object::Integer(40),
        },
    ));

    let subscribe = doc.add_object(widget(
        page,
        660,
        dictionary! {
            "FT" => name("Btn"),
            "T" => Object::string_literal("Subscribe"),
            "V" => name("Off"),
            "AS" => name("Off"),
            "AP" => states("Yes"),
        },
    ));

    let color = doc.new_object_id();
    let mut color_widgets = Vec::new();
    for (i, option) in ["Red", "Blue"].into_iter().enumerate() {
        let w = widget(
            page,
            620 - 30 * i as i64,
            dictionary! {
                "Parent" => Object::Reference(color),
                "AS" => name("Off"),
                "AP" => states(option),
            },
        );
        color_widgets.push(doc.add_object(w));
    }
    doc.objects.insert(
        color,
        Object::Dictionary(dictionary! {
            "FT" => name("Btn"),
            "T" => Object::string_literal("Color"),
            "Ff" => Object::Integer(1 << 15),
            "V" => name("Off"),
            "Kids" => Object::Array(color_widgets.iter().copied().map(Object::Reference).collect()),
        }),
    );

    let country = doc.add_object(widget(
        page,
        540,
        dictionary! {
            "FT" => name("Ch"),
            "T" => Object::string_literal("Country"),
            "Ff" => Object::Integer(1 << 17),
            "V" => Object::string_literal("DE"),
            "Opt" => Object::Array(vec![
                Object::string_literal("DE"),
                Object::string_literal("FR"),
                Object::Array(vec![
                    Object::string_literal("US"),
                    Object::string_literal("United States"),
                ]),
            ]),
        },
    ));

    let address = doc.new_object_id();
    let street = doc.add_object(widget(
        page,
        500,
        dictionary! {
            "FT" => name("Tx"),
            "T" => Object::string_literal("Street"),
            "Parent" => Object::Reference(address),
        },
    ));
    doc.objects.insert(
        address,
        Object::Dictionary(dictionary! {
            "T" => Object::string_literal("Address"),
            "Kids" => Object::Array(vec![Object::Reference(street)]),
        }),
    );

    let submit = doc.add_object(widget(
        page,
        460,
        dictionary! {
            "FT" => name("Btn"),
            "T" => Object::string_literal("Submit"),
            "Ff" => Object::Integer(1 << 16),
        },
    ));

    let mut widgets = vec![name_field, subscribe];
    widgets.extend(color_widgets);
    widgets.extend([country, street, submit]);

    finish(
        doc,
        pages,
        page,
        vec![name_field, subscribe, color, country, address, submit],
        widgets,
    )
}

/// A one-page document without an AcroForm.
pub fn blank_document() -> Result<Vec<u8>, lopdf::Error> {
    let mut doc = Document::with_version("1.7");
    let pages = doc.new_object_id();
    let page = doc.new_object_id();
    finish(doc, pages, page, Vec::new(), Vec::new())
}
