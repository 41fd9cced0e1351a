//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! Exact byte-for-byte fingerprints of the catalog probes issued by the
//! reporting tool's metadata layer, and the static row data this proxy
//! answers them with.
//!
//! The BI tool drives its own catalog walk independent of anything a user
//! asks for, so these six queries show up unprompted on first connect.
//! They are intercepted rather than forwarded because `pg_catalog` and
//! `information_schema` do not exist as real tables in the analytic
//! store.

/// Exact SQL text of the tool's "load all supported types" probe.
pub const SUPPORTED_TYPES_QUERY: &str = "\r\n/*** Load all supported types ***/\r\nSELECT ns.nspname, a.typname, a.oid, a.typrelid, a.typbasetype,\r\nCASE WHEN pg_proc.proname='array_recv' THEN 'a' ELSE a.typtype END AS type,\r\nCASE\r\n  WHEN pg_proc.proname='array_recv' THEN a.typelem\r\n  WHEN a.typtype='r' THEN rngsubtype\r\n  ELSE 0\r\nEND AS elemoid,\r\nCASE\r\n  WHEN pg_proc.proname IN ('array_recv','oidvectorrecv') THEN 3    /* Arrays last */\r\n  WHEN a.typtype='r' THEN 2                                        /* Ranges before */\r\n  WHEN a.typtype='d' THEN 1                                        /* Domains before */\r\n  ELSE 0                                                           /* Base types first */\r\nEND AS ord\r\nFROM pg_type AS a\r\nJOIN pg_namespace AS ns ON (ns.oid = a.typnamespace)\r\nJOIN pg_proc ON pg_proc.oid = a.typreceive\r\nLEFT OUTER JOIN pg_class AS cls ON (cls.oid = a.typrelid)\r\nLEFT OUTER JOIN pg_type AS b ON (b.oid = a.typelem)\r\nLEFT OUTER JOIN pg_class AS elemcls ON (elemcls.oid = b.typrelid)\r\nLEFT OUTER JOIN pg_range ON (pg_range.rngtypid = a.oid) \r\nWHERE\r\n  a.typtype IN ('b', 'r', 'e', 'd') OR         /* Base, range, enum, domain */\r\n  (a.typtype = 'c' AND cls.relkind='c') OR /* User-defined free-standing composites (not table composites) by default */\r\n  (pg_proc.proname='array_recv' AND (\r\n    b.typtype IN ('b', 'r', 'e', 'd') OR       /* Array of base, range, enum, domain */\r\n    (b.typtype = 'p' AND b.typname IN ('record', 'void')) OR /* Arrays of special supported pseudo-types */\r\n    (b.typtype = 'c' AND elemcls.relkind='c')  /* Array of user-defined free-standing composites (not table composites) */\r\n  )) OR\r\n  (a.typtype = 'p' AND a.typname IN ('record', 'void'))  /* Some special supported pseudo-types */\r\nORDER BY ord";

/// Free-standing composite type field definitions. Always answered empty —
/// this proxy never reports any composite types from `SUPPORTED_TYPES`.
pub const FIELD_DEF_COMPOSITE_TYPES_QUERY: &str = "/*** Load field definitions for (free-standing) composite types ***/\r\nSELECT typ.oid, att.attname, att.atttypid\r\nFROM pg_type AS typ\r\nJOIN pg_namespace AS ns ON (ns.oid = typ.typnamespace)\r\nJOIN pg_class AS cls ON (cls.oid = typ.typrelid)\r\nJOIN pg_attribute AS att ON (att.attrelid = typ.typrelid)\r\nWHERE\r\n  (typ.typtype = 'c' AND cls.relkind='c') AND\r\n  attnum > 0 AND     /* Don't load system attributes */\r\n  NOT attisdropped\r\nORDER BY typ.oid, att.attnum";

/// Enum label definitions. Always answered empty — no enum types are ever
/// reported from `SUPPORTED_TYPES`.
pub const ENUM_FIELDS_QUERY: &str = "/*** Load enum fields ***/\r\nSELECT pg_type.oid, enumlabel\r\nFROM pg_enum\r\nJOIN pg_type ON pg_type.oid=enumtypid\r\nORDER BY oid, enumsortorder";

/// Always answered with the single row `UTF8`.
pub const CHAR_SET_QUERY: &str = "select character_set_name from INFORMATION_SCHEMA.character_sets";

/// Lists every user table outside `pg_catalog`/`information_schema`.
/// Answered from `Backend::list_tables`.
pub const USER_TABLE_LIST_QUERY: &str = "select TABLE_SCHEMA, TABLE_NAME, TABLE_TYPE\r\nfrom INFORMATION_SCHEMA.tables\r\nwhere TABLE_SCHEMA not in ('information_schema', 'pg_catalog')\r\norder by TABLE_SCHEMA, TABLE_NAME";

/// Prefix of the per-table column info probe; the query is matched by
/// this prefix, and the queried table name is parsed out of the
/// `TABLE_NAME = '...'` clause that follows it. Answered from
/// `Backend::describe_table`.
pub const COLUMN_INFO_QUERY_PREFIX: &str = "select COLUMN_NAME, ORDINAL_POSITION, IS_NULLABLE, case when (data_type like '%unsigned%') then DATA_TYPE || ' unsigned' else DATA_TYPE end as DATA_TYPE\r\nfrom INFORMATION_SCHEMA.columns\r\nwhere TABLE_SCHEMA = 'public' and TABLE_NAME =";

/// Row data answering `SUPPORTED_TYPES_QUERY`: every base, range, array,
/// and `information_schema` domain type this proxy admits exists, in the
/// column order the query names (`nspname, typname, oid, typrelid,
/// typbasetype, type, elemoid, ord`). A handful of pseudo-types
/// (`record`, `void`) and range/array variants are included purely
/// because the BI tool's catalog walk expects to see them; this proxy
/// itself only ever emits `int4`/`text`-shaped columns.
pub static SUPPORTED_TYPES: &[(&str, &str, i32, i32, i32, char, i32, i32)] = &[
    ("pg_catalog", "float8", 701, 0, 0, 'b', 0, 0),
    ("pg_catalog", "tid", 27, 0, 0, 'b', 0, 0),
    ("pg_catalog", "xid", 28, 0, 0, 'b', 0, 0),
    ("pg_catalog", "cid", 29, 0, 0, 'b', 0, 0),
    ("pg_catalog", "bytea", 17, 0, 0, 'b', 0, 0),
    ("pg_catalog", "json", 114, 0, 0, 'b', 0, 0),
    ("pg_catalog", "xml", 142, 0, 0, 'b', 0, 0),
    ("pg_catalog", "pg_node_tree", 194, 0, 0, 'b', 0, 0),
    ("pg_catalog", "pg_ndistinct", 3361, 0, 0, 'b', 0, 0),
    ("pg_catalog", "pg_dependencies", 3402, 0, 0, 'b', 0, 0),
    ("pg_catalog", "pg_mcv_list", 5017, 0, 0, 'b', 0, 0),
    ("pg_catalog", "point", 600, 0, 0, 'b', 0, 0),
    ("pg_catalog", "lseg", 601, 0, 0, 'b', 0, 0),
    ("pg_catalog", "path", 602, 0, 0, 'b', 0, 0),
    ("pg_catalog", "box", 603, 0, 0, 'b', 0, 0),
    ("pg_catalog", "polygon", 604, 0, 0, 'b', 0, 0),
    ("pg_catalog", "line", 628, 0, 0, 'b', 0, 0),
    ("pg_catalog", "float4", 700, 0, 0, 'b', 0, 0),
    ("pg_catalog", "oid", 26, 0, 0, 'b', 0, 0),
    ("pg_catalog", "circle", 718, 0, 0, 'b', 0, 0),
    ("pg_catalog", "money", 790, 0, 0, 'b', 0, 0),
    ("pg_catalog", "macaddr", 829, 0, 0, 'b', 0, 0),
    ("pg_catalog", "inet", 869, 0, 0, 'b', 0, 0),
    ("pg_catalog", "cidr", 650, 0, 0, 'b', 0, 0),
    ("pg_catalog", "macaddr8", 774, 0, 0, 'b', 0, 0),
    ("pg_catalog", "bpchar", 1042, 0, 0, 'b', 0, 0),
    ("pg_catalog", "varchar", 1043, 0, 0, 'b', 0, 0),
    ("pg_catalog", "date", 1082, 0, 0, 'b', 0, 0),
    ("pg_catalog", "time", 1083, 0, 0, 'b', 0, 0),
    ("pg_catalog", "timestamp", 1114, 0, 0, 'b', 0, 0),
    ("pg_catalog", "timestamptz", 1184, 0, 0, 'b', 0, 0),
    ("pg_catalog", "interval", 1186, 0, 0, 'b', 0, 0),
    ("pg_catalog", "timetz", 1266, 0, 0, 'b', 0, 0),
    ("pg_catalog", "bit", 1560, 0, 0, 'b', 0, 0),
    ("pg_catalog", "varbit", 1562, 0, 0, 'b', 0, 0),
    ("pg_catalog", "numeric", 1700, 0, 0, 'b', 0, 0),
    ("pg_catalog", "refcursor", 1790, 0, 0, 'b', 0, 0),
    ("pg_catalog", "regprocedure", 2202, 0, 0, 'b', 0, 0),
    ("pg_catalog", "regoper", 2203, 0, 0, 'b', 0, 0),
    ("pg_catalog", "regoperator", 2204, 0, 0, 'b', 0, 0),
    ("pg_catalog", "regclass", 2205, 0, 0, 'b', 0, 0),
    ("pg_catalog", "regtype", 2206, 0, 0, 'b', 0, 0),
    ("pg_catalog", "regrole", 4096, 0, 0, 'b', 0, 0),
    ("pg_catalog", "regnamespace", 4089, 0, 0, 'b', 0, 0),
    ("pg_catalog", "uuid", 2950, 0, 0, 'b', 0, 0),
    ("pg_catalog", "pg_lsn", 3220, 0, 0, 'b', 0, 0),
    ("pg_catalog", "tsvector", 3614, 0, 0, 'b', 0, 0),
    ("pg_catalog", "tsquery", 3615, 0, 0, 'b', 0, 0),
    ("pg_catalog", "regconfig", 3734, 0, 0, 'b', 0, 0),
    ("pg_catalog", "regdictionary", 3769, 0, 0, 'b', 0, 0),
    ("pg_catalog", "jsonb", 3802, 0, 0, 'b', 0, 0),
    ("pg_catalog", "jsonpath", 4072, 0, 0, 'b', 0, 0),
    ("pg_catalog", "txid_snapshot", 2970, 0, 0, 'b', 0, 0),
    ("pg_catalog", "record", 2249, 0, 0, 'p', 0, 0),
    ("pg_catalog", "char", 18, 0, 0, 'b', 0, 0),
    ("pg_catalog", "void", 2278, 0, 0, 'p', 0, 0),
    ("pg_catalog", "name", 19, 0, 0, 'b', 0, 0),
    ("pg_catalog", "int8", 20, 0, 0, 'b', 0, 0),
    ("pg_catalog", "int2", 21, 0, 0, 'b', 0, 0),
    ("pg_catalog", "int2vector", 22, 0, 0, 'b', 0, 0),
    ("pg_catalog", "int4", 23, 0, 0, 'b', 0, 0),
    ("pg_catalog", "regproc", 24, 0, 0, 'b', 0, 0),
    ("pg_catalog", "text", 25, 0, 0, 'b', 0, 0),
    ("pg_catalog", "bool", 16, 0, 0, 'b', 0, 0),
    ("pg_catalog", "int4range", 3904, 0, 0, 'r', 23, 2),
    ("pg_catalog", "int8range", 3926, 0, 0, 'r', 20, 2),
    ("pg_catalog", "numrange", 3906, 0, 0, 'r', 1700, 2),
    ("pg_catalog", "tsrange", 3908, 0, 0, 'r', 1114, 2),
    ("pg_catalog", "tstzrange", 3910, 0, 0, 'r', 1184, 2),
    ("pg_catalog", "daterange", 3912, 0, 0, 'r', 1082, 2),
    ("pg_catalog", "oidvector", 30, 0, 0, 'b', 0, 3),
    ("pg_catalog", "_record", 2287, 0, 0, 'a', 2249, 3),
    ("pg_catalog", "_bool", 1000, 0, 0, 'a', 16, 3),
    ("pg_catalog", "_bytea", 1001, 0, 0, 'a', 17, 3),
    ("pg_catalog", "_char", 1002, 0, 0, 'a', 18, 3),
    ("pg_catalog", "_name", 1003, 0, 0, 'a', 19, 3),
    ("pg_catalog", "_int8", 1016, 0, 0, 'a', 20, 3),
    ("pg_catalog", "_int2", 1005, 0, 0, 'a', 21, 3),
    ("pg_catalog", "_int2vector", 1006, 0, 0, 'a', 22, 3),
    ("pg_catalog", "_int4", 1007, 0, 0, 'a', 23, 3),
    ("pg_catalog", "_regproc", 1008, 0, 0, 'a', 24, 3),
    ("pg_catalog", "_text", 1009, 0, 0, 'a', 25, 3),
    ("pg_catalog", "_oid", 1028, 0, 0, 'a', 26, 3),
    ("pg_catalog", "_tid", 1010, 0, 0, 'a', 27, 3),
    ("pg_catalog", "_xid", 1011, 0, 0, 'a', 28, 3),
    ("pg_catalog", "_cid", 1012, 0, 0, 'a', 29, 3),
    ("pg_catalog", "_oidvector", 1013, 0, 0, 'a', 30, 3),
    ("pg_catalog", "_json", 199, 0, 0, 'a', 114, 3),
    ("pg_catalog", "_xml", 143, 0, 0, 'a', 142, 3),
    ("pg_catalog", "_point", 1017, 0, 0, 'a', 600, 3),
    ("pg_catalog", "_lseg", 1018, 0, 0, 'a', 601, 3),
    ("pg_catalog", "_path", 1019, 0, 0, 'a', 602, 3),
    ("pg_catalog", "_box", 1020, 0, 0, 'a', 603, 3),
    ("pg_catalog", "_polygon", 1027, 0, 0, 'a', 604, 3),
    ("pg_catalog", "_line", 629, 0, 0, 'a', 628, 3),
    ("pg_catalog", "_float4", 1021, 0, 0, 'a', 700, 3),
    ("pg_catalog", "_float8", 1022, 0, 0, 'a', 701, 3),
    ("pg_catalog", "_circle", 719, 0, 0, 'a', 718, 3),
    ("pg_catalog", "_money", 791, 0, 0, 'a', 790, 3),
    ("pg_catalog", "_macaddr", 1040, 0, 0, 'a', 829, 3),
    ("pg_catalog", "_inet", 1041, 0, 0, 'a', 869, 3),
    ("pg_catalog", "_cidr", 651, 0, 0, 'a', 650, 3),
    ("pg_catalog", "_macaddr8", 775, 0, 0, 'a', 774, 3),
    ("pg_catalog", "_aclitem", 1034, 0, 0, 'a', 1033, 3),
    ("pg_catalog", "_bpchar", 1014, 0, 0, 'a', 1042, 3),
    ("pg_catalog", "_varchar", 1015, 0, 0, 'a', 1043, 3),
    ("pg_catalog", "_date", 1182, 0, 0, 'a', 1082, 3),
    ("pg_catalog", "_time", 1183, 0, 0, 'a', 1083, 3),
    ("pg_catalog", "_timestamp", 1115, 0, 0, 'a', 1114, 3),
    ("pg_catalog", "_timestamptz", 1185, 0, 0, 'a', 1184, 3),
    ("pg_catalog", "_interval", 1187, 0, 0, 'a', 1186, 3),
    ("pg_catalog", "_timetz", 1270, 0, 0, 'a', 1266, 3),
    ("pg_catalog", "_bit", 1561, 0, 0, 'a', 1560, 3),
    ("pg_catalog", "_varbit", 1563, 0, 0, 'a', 1562, 3),
    ("pg_catalog", "_numeric", 1231, 0, 0, 'a', 1700, 3),
    ("pg_catalog", "_refcursor", 2201, 0, 0, 'a', 1790, 3),
    ("pg_catalog", "_regprocedure", 2207, 0, 0, 'a', 2202, 3),
    ("pg_catalog", "_regoper", 2208, 0, 0, 'a', 2203, 3),
    ("pg_catalog", "_regoperator", 2209, 0, 0, 'a', 2204, 3),
    ("pg_catalog", "_regclass", 2210, 0, 0, 'a', 2205, 3),
    ("pg_catalog", "_regtype", 2211, 0, 0, 'a', 2206, 3),
    ("pg_catalog", "_regrole", 4097, 0, 0, 'a', 4096, 3),
    ("pg_catalog", "_regnamespace", 4090, 0, 0, 'a', 4089, 3),
    ("pg_catalog", "_uuid", 2951, 0, 0, 'a', 2950, 3),
    ("pg_catalog", "_pg_lsn", 3221, 0, 0, 'a', 3220, 3),
    ("pg_catalog", "_tsvector", 3643, 0, 0, 'a', 3614, 3),
    ("pg_catalog", "_gtsvector", 3644, 0, 0, 'a', 3642, 3),
    ("pg_catalog", "_tsquery", 3645, 0, 0, 'a', 3615, 3),
    ("pg_catalog", "_regconfig", 3735, 0, 0, 'a', 3734, 3),
    ("pg_catalog", "_regdictionary", 3770, 0, 0, 'a', 3769, 3),
    ("pg_catalog", "_jsonb", 3807, 0, 0, 'a', 3802, 3),
    ("pg_catalog", "_jsonpath", 4073, 0, 0, 'a', 4072, 3),
    ("pg_catalog", "_txid_snapshot", 2949, 0, 0, 'a', 2970, 3),
    ("pg_catalog", "_int4range", 3905, 0, 0, 'a', 3904, 3),
    ("pg_catalog", "_numrange", 3907, 0, 0, 'a', 3906, 3),
    ("pg_catalog", "_tsrange", 3909, 0, 0, 'a', 3908, 3),
    ("pg_catalog", "_tstzrange", 3911, 0, 0, 'a', 3910, 3),
    ("pg_catalog", "_daterange", 3913, 0, 0, 'a', 3912, 3),
    ("pg_catalog", "_int8range", 3927, 0, 0, 'a', 3926, 3),
    ("pg_catalog", "_cstring", 1263, 0, 0, 'a', 2275, 3),
    ("information_schema", "time_stamp", 13151, 0, 1184, 'd', 0, 1),
    ("information_schema", "sql_identifier", 13146, 0, 19, 'd', 0, 1),
    ("information_schema", "cardinal_number", 13141, 0, 23, 'd', 0, 1),
    ("information_schema", "yes_or_no", 13153, 0, 1043, 'd', 0, 1),
    ("information_schema", "character_data", 13144, 0, 1043, 'd', 0, 1),
    ("information_schema", "_cardinal_number", 13140, 0, 0, 'a', 13141, 3),
    ("information_schema", "_character_data", 13143, 0, 0, 'a', 13144, 3),
    ("information_schema", "_sql_identifier", 13145, 0, 0, 'a', 13146, 3),
    ("information_schema", "_time_stamp", 13150, 0, 0, 'a', 13151, 3),
    ("information_schema", "_yes_or_no", 13152, 0, 0, 'a', 13153, 3),
];
